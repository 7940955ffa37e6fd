//! spindle-core
//!
//! Bounded parallel batch execution: run one command per input element
//! across a fixed-size pool of execution contexts.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, element, invocation, diagnostic, options, result）
//! - **ports**: 抽象化レイヤー（CommandTable, Procedure, Clock, IdGenerator）
//! - **app**: 実行ロジック（resolver, pool, launcher, dispatcher, watcher, batch）
//! - **impls**: 実装（CommandRegistry, FnProcedure, 外部プログラム起動）
//! - **error**: エラー型

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use app::{Batch, BatchBuilder, BatchOutput, BatchRun, CommandRef};
pub use domain::{
    BatchOptions, BatchSummary, DiagnosticRecord, Element, InputSource, Progress, WorkerResult,
};
pub use error::SpindleError;
