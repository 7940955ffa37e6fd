//! Diagnostics forwarded to the caller: stream records and progress telemetry.
//!
//! ```text
//!   worker host buffers ──▶ harvest ──┐
//!   dispatcher trace ─────────────────┼──▶ records  (mpsc, every message)
//!   watcher timeout warning ──────────┘
//!   watcher / canceller progress ────────▶ progress (watch, latest only)
//! ```
//!
//! Progress is a snapshot: a caller that never looks at it holds one value,
//! not a backlog of every poll cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

/// Diagnostic stream of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Verbose,
    Debug,
    Warning,
    Information,
    Error,
}

impl Stream {
    /// Order in which a harvested worker's buffers are forwarded.
    pub const FORWARD_ORDER: [Stream; 5] = [
        Stream::Verbose,
        Stream::Debug,
        Stream::Warning,
        Stream::Information,
        Stream::Error,
    ];
}

/// One message on a diagnostic stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub stream: Stream,
    /// Index of the originating worker; `None` for pool-wide messages.
    pub worker: Option<usize>,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Progress telemetry emitted by the watcher and canceller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// "Running" or "Stopping".
    pub activity: String,
    pub percent: u8,
    pub status: String,
    pub completed: bool,
}

/// Cloneable sending side of the caller's diagnostic channels.
///
/// Writes never block. If the caller dropped the receivers the message is
/// discarded.
#[derive(Debug, Clone)]
pub struct DiagnosticSink {
    records: mpsc::UnboundedSender<DiagnosticRecord>,
    progress: Arc<watch::Sender<Option<Progress>>>,
}

/// Receiving side handed to the caller.
#[derive(Debug)]
pub struct DiagnosticReceiver {
    pub records: mpsc::UnboundedReceiver<DiagnosticRecord>,
    /// Latest progress snapshot; `None` until the first poll cycle.
    pub progress: watch::Receiver<Option<Progress>>,
}

/// Create a new diagnostic channel pair.
pub fn diagnostic_channel() -> (DiagnosticSink, DiagnosticReceiver) {
    let (records_tx, records_rx) = mpsc::unbounded_channel();
    let (progress_tx, progress_rx) = watch::channel(None);
    (
        DiagnosticSink {
            records: records_tx,
            progress: Arc::new(progress_tx),
        },
        DiagnosticReceiver {
            records: records_rx,
            progress: progress_rx,
        },
    )
}

impl DiagnosticSink {
    pub fn record(&self, stream: Stream, worker: Option<usize>, message: impl Into<String>) {
        let record = DiagnosticRecord {
            stream,
            worker,
            message: message.into(),
            at: Utc::now(),
        };
        let _ = self.records.send(record);
    }

    /// Replace the progress snapshot.
    pub fn progress(&self, progress: Progress) {
        // receiver がいなくても値は置き換える
        self.progress.send_replace(Some(progress));
    }
}

impl DiagnosticReceiver {
    /// Records already queued, without waiting.
    pub fn drain_records(&mut self) -> Vec<DiagnosticRecord> {
        std::iter::from_fn(|| self.records.try_recv().ok()).collect()
    }

    pub fn latest_progress(&self) -> Option<Progress> {
        self.progress.borrow().clone()
    }
}
