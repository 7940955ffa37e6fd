//! Watcher - the polling loop that harvests completed workers.
//!
//! # フロー（1 サイクル）
//! 1. 完了した worker と未完了の worker に分ける
//! 2. progress を出す（残りの入力を 60 文字までプレビュー）
//! 3. 完了した worker を harvest（結果・diagnostic を回収）
//! 4. `Dispose` なら context を破棄して結果を流す / `KeepWorkers` なら worker を返す
//! 5. harvest があれば（harvest の後で）idle timer をリセット
//! 6. idle timeout を超えたら未完了を全部 cancel し、cancellation モードで再度 watch
//! 7. poll interval だけ sleep
//!
//! Completion is judged per worker from its own phase, so a batch mixing
//! running and cancelling workers is reaped correctly. The mode only labels
//! telemetry and decides what an idle timeout does.
//!
//! Results go out on an unbounded channel, so a slow reader never suspends
//! the loop; the only wait inside a cycle is the poll sleep.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::canceller;
use super::pool::ContextPool;
use super::progress;
use super::worker::{Harvest, ReadyWorker, Worker};
use crate::domain::{DiagnosticSink, Stream, WorkerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Awaiting normal invocations (warm-up or real commands).
    Invocations,
    /// Reaping cancellations requested after an idle timeout.
    Cancellations,
}

impl WatchMode {
    fn activity(self) -> &'static str {
        match self {
            WatchMode::Invocations => "Running",
            WatchMode::Cancellations => "Stopping",
        }
    }
}

/// What to do with a normally completed worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPolicy {
    /// Hand the ready worker back (warm-up pass).
    KeepWorkers,
    /// Dispose the context and emit the result (final pass).
    Dispose,
}

#[derive(Debug, Default)]
pub struct WatchReport {
    /// Workers handed back under `HarvestPolicy::KeepWorkers`.
    pub kept: Vec<ReadyWorker>,
    /// Normal completions emitted as results.
    pub completed: usize,
    /// Workers reaped as cancellations or force-disposed.
    pub cancelled: usize,
    pub timed_out: bool,
}

pub struct Watcher<'a> {
    pool: &'a ContextPool,
    sink: &'a DiagnosticSink,
    results: &'a mpsc::UnboundedSender<WorkerResult>,
    poll_interval: Duration,
    idle_timeout: Duration,
}

impl<'a> Watcher<'a> {
    pub fn new(
        pool: &'a ContextPool,
        sink: &'a DiagnosticSink,
        results: &'a mpsc::UnboundedSender<WorkerResult>,
        poll_interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            sink,
            results,
            poll_interval,
            idle_timeout,
        }
    }

    /// Poll `workers` until every one is harvested.
    ///
    /// When the idle timeout fires in `Invocations` mode the stragglers are
    /// cancelled and watched again in `Cancellations` mode before returning.
    pub async fn watch(&self, workers: Vec<Worker>, mode: WatchMode, policy: HarvestPolicy) -> WatchReport {
        let mut report = WatchReport::default();
        let mut next = Some((workers, mode));
        while let Some((workers, mode)) = next.take() {
            next = self
                .poll_until_done(workers, mode, policy, &mut report)
                .await
                .map(|cancelled| (cancelled, WatchMode::Cancellations));
        }
        report
    }

    /// One watcher pass. Returns the cancelled stragglers when an idle
    /// timeout fired in `Invocations` mode.
    async fn poll_until_done(
        &self,
        workers: Vec<Worker>,
        mode: WatchMode,
        policy: HarvestPolicy,
        report: &mut WatchReport,
    ) -> Option<Vec<Worker>> {
        let total = workers.len();
        let activity = mode.activity();
        let mut pending = workers;
        let mut harvested = 0usize;
        let mut idle_since = Instant::now();
        let mut stragglers = None;

        while !pending.is_empty() {
            let (done, waiting): (Vec<Worker>, Vec<Worker>) =
                pending.into_iter().partition(Worker::is_complete);
            pending = waiting;

            let remaining = progress::preview(pending.iter().map(Worker::input_text));
            self.sink
                .progress(progress::running(activity, harvested, total, &remaining));

            let any_done = !done.is_empty();
            for worker in done {
                harvested += 1;
                self.harvest(worker, policy, report).await;
            }
            if any_done {
                idle_since = Instant::now();
            }

            if pending.is_empty() {
                break;
            }

            if idle_since.elapsed() > self.idle_timeout {
                report.timed_out = true;
                let remaining = progress::preview(pending.iter().map(Worker::input_text));
                let message = format!(
                    "no worker completed within the idle timeout of {}s; {} still incomplete: {}",
                    self.idle_timeout.as_secs_f64(),
                    pending.len(),
                    remaining
                );
                tracing::warn!(mode = ?mode, incomplete = pending.len(), "{message}");
                self.sink.record(Stream::Warning, None, message);

                let left = std::mem::take(&mut pending);
                match mode {
                    WatchMode::Invocations => {
                        stragglers = Some(canceller::cancel_all(left, self.sink));
                    }
                    WatchMode::Cancellations => {
                        // cancellation すら返ってこない worker は諦めて破棄する
                        for worker in left {
                            tracing::warn!(index = worker.index(), "cancellation did not complete, detaching");
                            report.cancelled += 1;
                            self.pool.dispose(worker.into_context());
                        }
                    }
                }
                break;
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        self.sink
            .progress(progress::finished(activity, harvested, total));
        stragglers
    }

    async fn harvest(&self, worker: Worker, policy: HarvestPolicy, report: &mut WatchReport) {
        let Harvest {
            worker,
            values,
            diagnostics,
            cancelled,
        } = worker.harvest().await;
        let index = worker.index();

        for (stream, message) in diagnostics {
            self.sink.record(stream, Some(index), message);
        }

        if cancelled {
            tracing::debug!(index, "reaped cancelled worker");
            report.cancelled += 1;
            self.pool.dispose(worker.into_context());
            return;
        }

        match policy {
            HarvestPolicy::KeepWorkers => report.kept.push(worker),
            HarvestPolicy::Dispose => {
                let result = WorkerResult {
                    index,
                    input_text: worker.input_text().to_string(),
                    values,
                };
                self.pool.dispose(worker.into_context());
                report.completed += 1;
                tracing::debug!(index, values = result.values.len(), "worker harvested");
                // 受け手が stream を drop していても batch は最後まで回す
                let _ = self.results.send(result);
            }
        }
    }
}
