//! Ports - 抽象化レイヤー
//!
//! batch の実行ロジック（app）が外部に依存する部分を trait で切り出す。
//! - どのコマンドを走らせるか（CommandTable, Procedure）
//! - 時刻と ID（Clock, IdGenerator）

pub mod clock;
pub mod command_table;
pub mod id_generator;
pub mod procedure;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::command_table::{CommandKind, CommandTable};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::procedure::Procedure;
