//! FnProcedure - closure を Procedure に変換するアダプタ

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Invocation, WorkerHost};
use crate::error::SpindleError;
use crate::ports::Procedure;

pub struct FnProcedure<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Procedure for FnProcedure<F>
where
    F: Fn(Invocation, WorkerHost) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<serde_json::Value>, SpindleError>> + Send,
{
    async fn call(
        &self,
        invocation: Invocation,
        host: WorkerHost,
    ) -> Result<Vec<serde_json::Value>, SpindleError> {
        (self.f)(invocation, host).await
    }
}

/// Wrap an async closure as a shareable [`Procedure`].
///
/// ```ignore
/// let echo = procedure_fn(|inv, _host| async move {
///     Ok(inv.positional(0).cloned().into_iter().collect())
/// });
/// ```
pub fn procedure_fn<F, Fut>(f: F) -> Arc<dyn Procedure>
where
    F: Fn(Invocation, WorkerHost) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<serde_json::Value>, SpindleError>> + Send + 'static,
{
    Arc::new(FnProcedure { f })
}
