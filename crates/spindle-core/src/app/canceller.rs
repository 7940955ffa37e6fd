//! Canceller - request cancellation of every still-running worker.
//!
//! Fire-and-forget: completion of a cancellation is only observed by the
//! watcher pass that reaps the returned workers.

use super::progress;
use super::worker::Worker;
use crate::domain::DiagnosticSink;

pub fn cancel_all(workers: Vec<Worker>, sink: &DiagnosticSink) -> Vec<Worker> {
    let total = workers.len();
    workers
        .into_iter()
        .enumerate()
        .map(|(n, worker)| {
            tracing::debug!(index = worker.index(), "requesting cancellation");
            let worker = worker.cancel();
            sink.progress(progress::stopping(n + 1, total));
            worker
        })
        .collect()
}
