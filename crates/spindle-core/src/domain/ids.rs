//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type でくるんで、`BatchId` と `ContextId` を
//! 型レベルで区別します。
//!
//! - 時刻でソート可能（生成順に並ぶ）
//! - 調整なしで生成できる
//! - PhantomData はメモリを消費しない

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait providing the display prefix of an ID type.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed identifier.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Batch のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Batch {}

impl IdMarker for Batch {
    fn prefix() -> &'static str {
        "batch-"
    }
}

/// Execution context のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {}

impl IdMarker for Context {
    fn prefix() -> &'static str {
        "ctx-"
    }
}

/// Identifier of one batch invocation.
pub type BatchId = Id<Batch>;

/// Identifier of an execution context handed out by the pool.
pub type ContextId = Id<Context>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_prefix() {
        let batch = BatchId::from_ulid(Ulid::new());
        let ctx = ContextId::from_ulid(Ulid::new());

        assert!(batch.to_string().starts_with("batch-"));
        assert!(ctx.to_string().starts_with("ctx-"));
        // let _: BatchId = ctx; // <- does not compile
    }

    #[test]
    fn ulid_ids_are_sortable() {
        let id1 = BatchId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = BatchId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<BatchId>(), size_of::<Ulid>());
        assert_eq!(size_of::<ContextId>(), 16);
    }
}
