//! Domain model (ids, elements, invocations, diagnostics, options, results).

pub mod diagnostic;
pub mod element;
pub mod host;
pub mod ids;
pub mod invocation;
pub mod options;
pub mod preference;
pub mod result;

pub use diagnostic::{
    DiagnosticReceiver, DiagnosticRecord, DiagnosticSink, Progress, Stream, diagnostic_channel,
};
pub use element::{Element, InputSource};
pub use host::WorkerHost;
pub use ids::{BatchId, ContextId};
pub use invocation::{Argument, Invocation};
pub use options::BatchOptions;
pub use preference::{ActionPreference, StreamPreferences};
pub use result::{BatchSummary, WorkerResult};
