//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **CommandRegistry**: in-memory の CommandTable（PATH fallback 付き）
//! - **FnProcedure**: closure を Procedure にするアダプタ
//! - **external**: 外部プログラムの起動

pub mod external;
pub mod procedure_fn;
pub mod registry;

pub use self::external::{resolve_in_path, run_external};
pub use self::procedure_fn::{FnProcedure, procedure_fn};
pub use self::registry::{CommandRegistry, RegistryError};
