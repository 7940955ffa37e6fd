//! Worker record and its phase transitions.
//!
//! State transitions:
//! - launch → Worker(Invoking warm-up) → harvest → ReadyWorker
//! - ReadyWorker → start → Worker(Invoking command) → harvest → (disposed)
//! - Worker(Invoking) → cancel → Worker(Cancelling) → harvest → (disposed)
//!
//! Every transition consumes the record and returns the next one, so a
//! worker is owned by exactly one phase of the batch at a time. Only a
//! [`ReadyWorker`] can be started, so a live invocation is never replaced.

use tokio::task::JoinHandle;

use super::pool::{ExecutionContext, InvocationOutput};
use crate::domain::{Element, Stream};

/// Completion token of an in-flight invocation.
#[derive(Debug)]
pub struct InvocationHandle(JoinHandle<InvocationOutput>);

impl InvocationHandle {
    pub fn new(handle: JoinHandle<InvocationOutput>) -> Self {
        Self(handle)
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

/// Completion token of an in-flight cancellation request.
#[derive(Debug)]
pub struct CancellationHandle(JoinHandle<InvocationOutput>);

impl CancellationHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

#[derive(Debug)]
pub enum Phase {
    Invoking(InvocationHandle),
    Cancelling(CancellationHandle),
}

/// A worker with a live handle.
#[derive(Debug)]
pub struct Worker {
    index: usize,
    input: Element,
    input_text: String,
    context: ExecutionContext,
    phase: Phase,
}

/// A harvested worker with no live handle, waiting for its command.
#[derive(Debug)]
pub struct ReadyWorker {
    index: usize,
    input: Element,
    input_text: String,
    context: ExecutionContext,
}

/// What harvesting a worker produced.
#[derive(Debug)]
pub struct Harvest {
    pub worker: ReadyWorker,
    pub values: Vec<serde_json::Value>,
    /// Drained diagnostic buffers, in forwarding order.
    pub diagnostics: Vec<(Stream, String)>,
    /// The task was actually aborted. A task that finished before the abort
    /// took effect counts as a normal completion.
    pub cancelled: bool,
}

impl Worker {
    pub fn new(index: usize, input: Element, context: ExecutionContext, handle: InvocationHandle) -> Self {
        let input_text = input.text();
        Self {
            index,
            input,
            input_text,
            context,
            phase: Phase::Invoking(handle),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input(&self) -> &Element {
        &self.input
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_cancelling(&self) -> bool {
        matches!(self.phase, Phase::Cancelling(_))
    }

    /// Whether the live handle (of whichever kind this worker carries) has
    /// completed.
    pub fn is_complete(&self) -> bool {
        match &self.phase {
            Phase::Invoking(h) => h.is_finished(),
            Phase::Cancelling(h) => h.is_finished(),
        }
    }

    /// Request cancellation of the live invocation. Fire-and-forget: the
    /// outcome is observed when the worker is harvested.
    pub fn cancel(self) -> Self {
        let Worker {
            index,
            input,
            input_text,
            context,
            phase,
        } = self;
        let phase = match phase {
            Phase::Invoking(InvocationHandle(handle)) => {
                handle.abort();
                Phase::Cancelling(CancellationHandle(handle))
            }
            cancelling @ Phase::Cancelling(_) => cancelling,
        };
        Worker {
            index,
            input,
            input_text,
            context,
            phase,
        }
    }

    /// Collect the completed invocation's output and drain the host buffers.
    ///
    /// Call only once [`is_complete`](Self::is_complete) holds; the handle is
    /// consumed here so a worker can never be harvested twice.
    pub async fn harvest(self) -> Harvest {
        let Worker {
            index,
            input,
            input_text,
            context,
            phase,
        } = self;

        // abort は完了済みの task には効かないので、どちらの phase でも結果を見る
        let handle = match phase {
            Phase::Invoking(InvocationHandle(handle)) => handle,
            Phase::Cancelling(CancellationHandle(handle)) => handle,
        };
        let mut values = Vec::new();
        let mut cancelled = false;
        match handle.await {
            Ok(Ok(v)) => values = v,
            Ok(Err(e)) => context.host().error(e.to_string()),
            Err(e) if e.is_cancelled() => cancelled = true,
            Err(e) => context.host().error(format!("worker panicked: {e}")),
        }

        let diagnostics = context.host().drain();
        Harvest {
            worker: ReadyWorker {
                index,
                input,
                input_text,
                context,
            },
            values,
            diagnostics,
            cancelled,
        }
    }

    /// Give up the context for disposal. Dropping the handle detaches the
    /// task.
    pub fn into_context(self) -> ExecutionContext {
        self.context
    }
}

impl ReadyWorker {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input(&self) -> &Element {
        &self.input
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Attach a freshly started invocation.
    pub fn start(self, handle: InvocationHandle) -> Worker {
        let ReadyWorker {
            index,
            input,
            input_text,
            context,
        } = self;
        Worker {
            index,
            input,
            input_text,
            context,
            phase: Phase::Invoking(handle),
        }
    }

    pub fn into_context(self) -> ExecutionContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pool::ContextPool;
    use crate::error::SpindleError;
    use serde_json::json;
    use std::time::Duration;

    fn spawn_worker(pool: &ContextPool, index: usize, value: serde_json::Value) -> Worker {
        let ctx = pool.create_context(index);
        let handle = ctx.spawn(move |_| async move { Ok(vec![value]) });
        Worker::new(index, Element::from("x"), ctx, InvocationHandle::new(handle))
    }

    async fn wait_complete(worker: &Worker) {
        while !worker.is_complete() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn harvest_returns_values_and_a_ready_worker() {
        let pool = ContextPool::new(2);
        let worker = spawn_worker(&pool, 0, json!(1));
        wait_complete(&worker).await;

        let harvest = worker.harvest().await;
        assert_eq!(harvest.values, vec![json!(1)]);
        assert!(!harvest.cancelled);
        assert_eq!(harvest.worker.index(), 0);
    }

    #[tokio::test]
    async fn cancelling_a_finished_task_keeps_its_output() {
        let pool = ContextPool::new(1);
        let worker = spawn_worker(&pool, 0, json!("done"));
        wait_complete(&worker).await;

        let worker = worker.cancel();
        assert!(worker.is_cancelling());
        let harvest = worker.harvest().await;
        assert!(!harvest.cancelled);
        assert_eq!(harvest.values, vec![json!("done")]);
    }

    #[tokio::test]
    async fn ready_worker_starts_a_new_invocation() {
        let pool = ContextPool::new(1);
        let worker = spawn_worker(&pool, 3, json!("warm"));
        wait_complete(&worker).await;
        let ready = worker.harvest().await.worker;

        let handle = ready.context().spawn(|_| async { Ok(vec![json!("real")]) });
        let running = ready.start(InvocationHandle::new(handle));
        assert!(matches!(running.phase(), Phase::Invoking(_)));
        wait_complete(&running).await;
        let harvest = running.harvest().await;
        assert_eq!(harvest.values, vec![json!("real")]);
        assert_eq!(harvest.worker.index(), 3);
    }

    #[tokio::test]
    async fn failures_land_in_the_error_stream() {
        let pool = ContextPool::new(1);
        let ctx = pool.create_context(0);
        let handle = ctx.spawn(|_| async { Err(SpindleError::procedure("boom")) });
        let worker = Worker::new(0, Element::from("x"), ctx, InvocationHandle::new(handle));
        wait_complete(&worker).await;

        let harvest = worker.harvest().await;
        assert!(harvest.values.is_empty());
        assert_eq!(harvest.diagnostics, vec![(Stream::Error, "boom".to_string())]);
    }

    #[tokio::test]
    async fn cancel_switches_to_cancelling_and_harvests_without_output() {
        let pool = ContextPool::new(1);
        let ctx = pool.create_context(0);
        let handle = ctx.spawn(|_| std::future::pending::<InvocationOutput>());
        let worker = Worker::new(0, Element::from("x"), ctx, InvocationHandle::new(handle));
        assert!(!worker.is_complete());

        let worker = worker.cancel();
        assert!(worker.is_cancelling());
        wait_complete(&worker).await;

        let harvest = worker.harvest().await;
        assert!(harvest.cancelled);
        assert!(harvest.values.is_empty());
    }

    #[tokio::test]
    async fn input_text_is_rendered_once_at_launch() {
        let pool = ContextPool::new(1);
        let ctx = pool.create_context(7);
        let handle = ctx.spawn(|_| async { Ok(vec![]) });
        let worker = Worker::new(7, Element::from(json!({"host": "a"})), ctx, InvocationHandle::new(handle));
        assert_eq!(worker.index(), 7);
        assert_eq!(worker.input_text(), r#"{"host":"a"}"#);
    }
}
