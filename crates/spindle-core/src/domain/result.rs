//! What a batch hands back: per-worker results and a closing summary.

use serde::{Deserialize, Serialize};

use super::ids::BatchId;

/// Result values harvested from one completed worker.
///
/// `values` may be empty (a command that produced nothing, or failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub index: usize,
    pub input_text: String,
    pub values: Vec<serde_json::Value>,
}

/// Counters reported once the batch has terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub total: usize,
    /// Workers harvested as normal completions.
    pub completed: usize,
    /// Workers reaped after a cancellation (or force-disposed).
    pub cancelled: usize,
    /// Whether the idle timeout fired at least once.
    pub timed_out: bool,
    pub contexts_disposed: usize,
}
