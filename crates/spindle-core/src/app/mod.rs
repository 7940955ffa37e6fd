//! App - アプリケーション層
//!
//! ports を組み合わせて batch の実行ロジックを実装する。
//!
//! # 主要コンポーネント
//! - **Resolver**: コマンド参照 → 実行単位（alias / procedure / 外部プログラム）
//! - **ContextPool**: 同時実行数を制限する execution context の pool
//! - **launcher**: element ごとに worker を作って warm-up を走らせる
//! - **dispatcher**: warm-up 済みの worker にコマンドを載せる
//! - **Watcher**: polling で完了を回収、idle timeout で cancel
//! - **canceller**: 残っている worker をまとめて cancel
//! - **Batch / BatchBuilder**: 公開エントリポイント

pub mod batch;
pub mod builder;
pub mod canceller;
pub mod dispatcher;
pub mod launcher;
pub mod pool;
pub mod progress;
pub mod resolver;
pub mod watcher;
pub mod worker;

// 主要な型を再エクスポート
pub use self::batch::{Batch, BatchOutput, BatchRun};
pub use self::builder::{BatchBuilder, BuildError};
pub use self::pool::{ContextPool, ExecutionContext};
pub use self::resolver::{CommandRef, Resolver, WorkUnit};
pub use self::watcher::{HarvestPolicy, WatchMode, WatchReport, Watcher};
pub use self::worker::{Phase, ReadyWorker, Worker};
