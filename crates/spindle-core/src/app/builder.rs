//! BatchBuilder - batch の構築とワイヤリング
//!
//! # ポイント
//! - Builder パターンでコマンドとオプションを揃える
//! - 起動時検証（Fail-fast 設計）: 期待したコマンドが引けなければ build で落とす
//! - オプションの検証も build で一度だけ行う

use std::sync::Arc;

use super::batch::Batch;
use crate::domain::BatchOptions;
use crate::error::SpindleError;
use crate::impls::{CommandRegistry, RegistryError};
use crate::ports::{CommandTable, Procedure};

/// BatchBuilder は Batch を構築
///
/// # 使用例
/// ```ignore
/// let batch = BatchBuilder::new()
///     .options(BatchOptions::from_env()?)
///     .procedure("Get-Echo", echo)?
///     .alias("echo", "Get-Echo")?
///     .expect_commands(&["echo"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_commands() で必要なコマンド名を宣言
/// - build() 時に全部が CommandTable で引けるかチェック（PATH fallback 込み）
/// - 不足があれば BuildError を返す
pub struct BatchBuilder {
    registry: CommandRegistry,
    options: BatchOptions,
    expected_commands: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing commands: {0:?}. These commands were expected but cannot be resolved.")]
    MissingCommands(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] SpindleError),
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
            options: BatchOptions::default(),
            expected_commands: None,
        }
    }

    pub fn options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn procedure(
        mut self,
        name: impl Into<String>,
        procedure: Arc<dyn Procedure>,
    ) -> Result<Self, RegistryError> {
        self.registry.register_procedure(name, procedure)?;
        Ok(self)
    }

    pub fn alias(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        self.registry.register_alias(name, target)?;
        Ok(self)
    }

    pub fn external(
        mut self,
        name: impl Into<String>,
        program: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        self.registry.register_external(name, program)?;
        Ok(self)
    }

    /// 未登録の名前を PATH から探す
    pub fn path_fallback(mut self) -> Self {
        self.registry = self.registry.with_path_fallback();
        self
    }

    pub fn expect_commands(mut self, names: &[&str]) -> Self {
        self.expected_commands = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// # 検証
    /// - expect_commands() の名前が全て lookup できるか
    /// - BatchOptions::validate()
    pub fn build(self) -> Result<Batch, BuildError> {
        if let Some(expected) = &self.expected_commands {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| self.registry.lookup(name).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingCommands(missing));
            }
        }
        let table: Arc<dyn CommandTable> = Arc::new(self.registry);
        Ok(Batch::new(self.options, table)?)
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::procedure_fn;

    fn noop() -> Arc<dyn Procedure> {
        procedure_fn(|_, _| async { Ok(vec![]) })
    }

    #[test]
    fn test_build_success() {
        let batch = BatchBuilder::new()
            .procedure("Get-Thing", noop())
            .unwrap()
            .alias("gt", "Get-Thing")
            .unwrap()
            .expect_commands(&["Get-Thing", "gt"])
            .build();
        assert!(batch.is_ok());
    }

    #[test]
    fn test_build_missing_commands() {
        let batch = BatchBuilder::new()
            .procedure("Get-Thing", noop())
            .unwrap()
            .expect_commands(&["Get-Thing", "Get-Other"])
            .build();
        assert!(matches!(
            batch,
            Err(BuildError::MissingCommands(missing)) if missing == vec!["Get-Other".to_string()]
        ));
    }

    #[test]
    fn test_build_no_expect_commands() {
        let batch = BatchBuilder::new().build();
        assert!(batch.is_ok());
    }

    #[test]
    fn test_duplicate_registration() {
        let result = BatchBuilder::new()
            .procedure("Get-Thing", noop())
            .unwrap()
            .external("Get-Thing", "thing");
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn test_invalid_options() {
        let batch = BatchBuilder::new()
            .options(BatchOptions::default().with_poll_interval_ms(0))
            .build();
        assert!(matches!(batch, Err(BuildError::Config(SpindleError::InvalidConfig { .. }))));
    }

    #[test]
    fn test_options_are_carried_into_the_batch() {
        let batch = BatchBuilder::new()
            .options(BatchOptions::default().with_max_concurrency(7))
            .build()
            .unwrap();
        assert_eq!(batch.options().max_concurrency, 7);
    }
}
