//! ContextPool - bounded pool of execution contexts.
//!
//! Admission is enforced inside each invocation: the spawned task waits for a
//! semaphore permit before running and holds it until it finishes. Callers
//! never check a slot out explicitly.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::{ContextId, StreamPreferences, WorkerHost};
use crate::error::SpindleError;
use crate::ports::{IdGenerator, SystemClock, UlidGenerator};

/// Output of one invocation running in a context.
pub type InvocationOutput = Result<Vec<serde_json::Value>, SpindleError>;

pub struct ContextPool {
    slots: Arc<Semaphore>,
    size: usize,
    ids: UlidGenerator<SystemClock>,
    created: AtomicUsize,
    disposed: AtomicUsize,
}

impl ContextPool {
    pub fn new(size: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
            ids: UlidGenerator::new(SystemClock),
            created: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not held by a running invocation (telemetry only).
    pub fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// A new context for worker `index`, starting from host-default stream
    /// preferences.
    pub fn create_context(&self, index: usize) -> ExecutionContext {
        self.created.fetch_add(1, Ordering::Relaxed);
        ExecutionContext {
            id: self.ids.generate_context_id(),
            host: WorkerHost::new(index, StreamPreferences::host_defaults()),
            slots: Arc::clone(&self.slots),
        }
    }

    /// Release a context. Taking it by value makes a second disposal impossible.
    pub fn dispose(&self, context: ExecutionContext) {
        tracing::trace!(context = %context.id, "disposing execution context");
        self.disposed.fetch_add(1, Ordering::Relaxed);
        drop(context);
    }

    pub fn contexts_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn contexts_disposed(&self) -> usize {
        self.disposed.load(Ordering::Relaxed)
    }

    /// Refuse every further invocation. Invocations started afterwards fail
    /// with `PoolClosed`.
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}

/// Isolated runtime slot of one worker.
#[derive(Debug)]
pub struct ExecutionContext {
    id: ContextId,
    host: WorkerHost,
    slots: Arc<Semaphore>,
}

impl ExecutionContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn host(&self) -> &WorkerHost {
        &self.host
    }

    /// Start `work` asynchronously inside the pool.
    ///
    /// Returns immediately; the task itself waits for a free slot.
    pub fn spawn<F, Fut>(&self, work: F) -> JoinHandle<InvocationOutput>
    where
        F: FnOnce(WorkerHost) -> Fut + Send + 'static,
        Fut: Future<Output = InvocationOutput> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let host = self.host.clone();
        tokio::spawn(async move {
            // permit は invocation が終わるまで保持する
            let _permit = slots
                .acquire_owned()
                .await
                .map_err(|_| SpindleError::PoolClosed)?;
            work(host).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn invocations_wait_for_a_free_slot() {
        let pool = ContextPool::new(1);
        let a = pool.create_context(0);
        let b = pool.create_context(1);

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let first = a.spawn(|_| async move {
            let _ = release_rx.await;
            Ok(vec![])
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.free_slots(), 0);

        let second = b.spawn(|_| async { Ok(vec![serde_json::json!("b")]) });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        release_tx.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(second.await.unwrap().unwrap(), vec![serde_json::json!("b")]);
        assert_eq!(pool.free_slots(), 1);
    }

    #[tokio::test]
    async fn closed_pool_rejects_new_invocations() {
        let pool = ContextPool::new(2);
        let ctx = pool.create_context(0);
        pool.close();

        let result = ctx.spawn(|_| async { Ok(vec![]) }).await.unwrap();
        assert!(matches!(result, Err(SpindleError::PoolClosed)));
        assert!(pool.is_closed());
    }

    #[test]
    fn dispose_is_counted_once_per_context() {
        let pool = ContextPool::new(2);
        let a = pool.create_context(0);
        let b = pool.create_context(1);
        assert_ne!(a.id(), b.id());

        pool.dispose(a);
        pool.dispose(b);
        assert_eq!(pool.contexts_created(), 2);
        assert_eq!(pool.contexts_disposed(), 2);
    }
}
