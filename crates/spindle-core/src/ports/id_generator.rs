//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: Clock の時刻 + ランダム部で ULID を作る

use crate::domain::ids::{BatchId, ContextId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は batch / context の ID を生成
///
/// 複数スレッドから使えるように `Send + Sync` を要求する。
pub trait IdGenerator: Send + Sync {
    fn generate_batch_id(&self) -> BatchId;

    fn generate_context_id(&self) -> ContextId;
}

/// ULID generator driven by a [`Clock`].
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_batch_id(&self) -> BatchId {
        BatchId::from(self.next_ulid())
    }

    fn generate_context_id(&self) -> ContextId {
        ContextId::from(self.next_ulid())
    }
}
