//! Batch - the public entry point.
//!
//! # 流れ
//! ```text
//! InputSource ─▶ elements
//!   launch (warm-up per element)
//!   watch(Invocations, KeepWorkers)   ← warm-up を全部回収
//!   dispatch (command per worker)
//!   watch(Invocations, Dispose)       ← 結果を stream に流す
//!   pool.close → BatchSummary
//! ```
//!
//! `run` returns as soon as the orchestrator task is spawned; results and
//! diagnostics arrive on the [`BatchRun`] channels while the batch progresses.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::Instrument;

use super::dispatcher::{self, DispatchPlan};
use super::launcher;
use super::pool::ContextPool;
use super::resolver::{CommandRef, Resolver, WorkUnit};
use super::watcher::{HarvestPolicy, WatchMode, Watcher};
use crate::domain::{
    BatchId, BatchOptions, BatchSummary, DiagnosticReceiver, DiagnosticRecord, DiagnosticSink,
    Element, InputSource, Progress, WorkerResult, diagnostic_channel,
};
use crate::error::SpindleError;
use crate::ports::{CommandTable, IdGenerator, SystemClock, UlidGenerator};

pub struct Batch {
    options: BatchOptions,
    resolver: Resolver,
    ids: UlidGenerator<SystemClock>,
}

impl Batch {
    /// Fails when `options` do not validate.
    pub fn new(options: BatchOptions, table: Arc<dyn CommandTable>) -> Result<Self, SpindleError> {
        options.validate()?;
        Ok(Self {
            options,
            resolver: Resolver::new(table),
            ids: UlidGenerator::new(SystemClock),
        })
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Run `command` once per element of `input`, at most
    /// `max_concurrency` at a time.
    ///
    /// Errors only when the input cannot be materialized. An unresolvable
    /// command still runs: every worker reports `command not found` on its
    /// error stream.
    pub async fn run(&self, command: CommandRef, input: InputSource) -> Result<BatchRun, SpindleError> {
        let elements = input.into_elements().await?;
        let unit = self.resolver.resolve(&command);
        if unit.is_empty() {
            tracing::warn!(command = unit.display_name(), "command could not be resolved");
        }

        let batch_id = self.ids.generate_batch_id();
        let (sink, diagnostics) = diagnostic_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let span = tracing::info_span!("batch", batch_id = %batch_id);
        let task = tokio::spawn(
            orchestrate(batch_id, self.options.clone(), unit, elements, sink, results_tx)
                .instrument(span),
        );

        Ok(BatchRun {
            batch_id,
            results: UnboundedReceiverStream::new(results_rx),
            diagnostics,
            task,
        })
    }
}

/// Handle on a running batch.
///
/// Reading `results` never paces the batch: the watcher hands results off
/// without waiting, and unread ones stay queued (at most one per element).
pub struct BatchRun {
    pub batch_id: BatchId,
    pub results: UnboundedReceiverStream<WorkerResult>,
    pub diagnostics: DiagnosticReceiver,
    task: JoinHandle<BatchSummary>,
}

/// Everything a batch produced, gathered by [`BatchRun::collect`].
#[derive(Debug)]
pub struct BatchOutput {
    pub summary: BatchSummary,
    pub results: Vec<WorkerResult>,
    pub diagnostics: Vec<DiagnosticRecord>,
    /// Last progress snapshot.
    pub progress: Option<Progress>,
}

impl BatchRun {
    /// Wait for the batch to terminate.
    ///
    /// Unread results and diagnostics are discarded.
    pub async fn join(self) -> Result<BatchSummary, SpindleError> {
        let BatchRun {
            results,
            diagnostics,
            task,
            ..
        } = self;
        drop(results);
        drop(diagnostics);
        task.await
            .map_err(|e| SpindleError::Orchestrator(e.to_string()))
    }

    /// Drain both channels to the end and wait for the summary.
    pub async fn collect(self) -> Result<BatchOutput, SpindleError> {
        let BatchRun {
            mut results,
            mut diagnostics,
            task,
            ..
        } = self;

        let mut collected = Vec::new();
        let mut seen = Vec::new();
        let mut diagnostics_open = true;
        loop {
            tokio::select! {
                next = results.next() => match next {
                    Some(result) => collected.push(result),
                    None => break,
                },
                next = diagnostics.records.recv(), if diagnostics_open => match next {
                    Some(d) => seen.push(d),
                    None => diagnostics_open = false,
                },
            }
        }

        let summary = task
            .await
            .map_err(|e| SpindleError::Orchestrator(e.to_string()))?;
        // orchestrator が終われば sink も drop されている
        while let Some(d) = diagnostics.records.recv().await {
            seen.push(d);
        }

        Ok(BatchOutput {
            summary,
            results: collected,
            diagnostics: seen,
            progress: diagnostics.latest_progress(),
        })
    }
}

async fn orchestrate(
    batch_id: BatchId,
    options: BatchOptions,
    unit: WorkUnit,
    elements: Vec<Element>,
    sink: DiagnosticSink,
    results: mpsc::UnboundedSender<WorkerResult>,
) -> BatchSummary {
    let total = elements.len();
    tracing::info!(total, command = unit.display_name(), max_concurrency = options.max_concurrency, "batch started");

    let pool = ContextPool::new(options.max_concurrency);
    let watcher = Watcher::new(
        &pool,
        &sink,
        &results,
        options.poll_interval(),
        options.idle_timeout(),
    );

    let workers = launcher::launch(&pool, elements, options.stream_preferences);
    let warm = watcher
        .watch(workers, WatchMode::Invocations, HarvestPolicy::KeepWorkers)
        .await;

    let plan = DispatchPlan::from_options(&options);
    let running = warm
        .kept
        .into_iter()
        .map(|worker| dispatcher::dispatch(worker, &unit, &plan, &sink))
        .collect();
    let report = watcher
        .watch(running, WatchMode::Invocations, HarvestPolicy::Dispose)
        .await;

    pool.close();

    let summary = BatchSummary {
        batch_id,
        total,
        completed: report.completed,
        cancelled: warm.cancelled + report.cancelled,
        timed_out: warm.timed_out || report.timed_out,
        contexts_disposed: pool.contexts_disposed(),
    };
    tracing::info!(
        completed = summary.completed,
        cancelled = summary.cancelled,
        timed_out = summary.timed_out,
        "batch finished"
    );
    summary
}
