//! Procedure port - a user-defined command run inside a worker.

use async_trait::async_trait;

use crate::domain::{Invocation, WorkerHost};
use crate::error::SpindleError;

/// A procedure receives the worker's invocation (element plus extra
/// arguments) and returns zero or more result values.
///
/// Diagnostics go to `host`; an `Err` is written to the worker's error
/// stream at harvest and never aborts the batch.
///
/// # 使用例
/// ```ignore
/// struct Identity;
///
/// #[async_trait]
/// impl Procedure for Identity {
///     async fn call(&self, inv: Invocation, _host: WorkerHost) -> Result<Vec<Value>, SpindleError> {
///         Ok(inv.positional(0).cloned().into_iter().collect())
///     }
/// }
/// ```
#[async_trait]
pub trait Procedure: Send + Sync {
    async fn call(
        &self,
        invocation: Invocation,
        host: WorkerHost,
    ) -> Result<Vec<serde_json::Value>, SpindleError>;
}
