//! CommandRegistry - in-memory command table.
//!
//! - 初期化中に登録（mutable）
//! - 実行中は読むだけ（immutable, `Arc` で共有）
//!
//! ロック不要でシンプルに保つ。

use std::collections::HashMap;
use std::sync::Arc;

use super::external::resolve_in_path;
use crate::ports::{CommandKind, CommandTable, Procedure};

/// RegistryError は CommandRegistry の登録エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("command '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Name → command kind, with an optional `PATH` fallback for unknown names.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandKind>,
    path_fallback: Option<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            path_fallback: None,
        }
    }

    /// Unknown names are searched in the process `PATH`.
    pub fn with_path_fallback(self) -> Self {
        let path = std::env::var("PATH").unwrap_or_default();
        self.with_search_path(path)
    }

    /// Unknown names are searched in `path` (colon separated).
    pub fn with_search_path(mut self, path: impl Into<String>) -> Self {
        self.path_fallback = Some(path.into());
        self
    }

    fn insert(&mut self, name: String, kind: CommandKind) -> Result<(), RegistryError> {
        if self.commands.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.commands.insert(name, kind);
        Ok(())
    }

    pub fn register_alias(
        &mut self,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.insert(name.into(), CommandKind::AliasOf(target.into()))
    }

    pub fn register_procedure(
        &mut self,
        name: impl Into<String>,
        procedure: Arc<dyn Procedure>,
    ) -> Result<(), RegistryError> {
        self.insert(name.into(), CommandKind::InlineProcedure(procedure))
    }

    /// Register `name` as an external program, run as `program`.
    pub fn register_external(
        &mut self,
        name: impl Into<String>,
        program: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.insert(name.into(), CommandKind::NamedCommand(program.into()))
    }

    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandTable for CommandRegistry {
    fn lookup(&self, name: &str) -> Option<CommandKind> {
        if let Some(kind) = self.commands.get(name) {
            return Some(kind.clone());
        }
        let path = self.path_fallback.as_deref()?;
        resolve_in_path(name, path).map(|_| CommandKind::NamedCommand(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::procedure_fn;

    #[test]
    fn register_and_lookup() {
        let mut reg = CommandRegistry::new();
        reg.register_alias("gt", "get-thing").unwrap();
        reg.register_external("pinger", "ping").unwrap();
        reg.register_procedure("get-thing", procedure_fn(|_, _| async { Ok(vec![]) }))
            .unwrap();

        assert!(matches!(reg.lookup("gt"), Some(CommandKind::AliasOf(t)) if t == "get-thing"));
        assert!(matches!(reg.lookup("pinger"), Some(CommandKind::NamedCommand(p)) if p == "ping"));
        assert!(matches!(reg.lookup("get-thing"), Some(CommandKind::InlineProcedure(_))));
        assert_eq!(reg.registered_names(), vec!["get-thing", "gt", "pinger"]);
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut reg = CommandRegistry::new();
        reg.register_alias("a", "b").unwrap();
        let result = reg.register_external("a", "c");
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(n)) if n == "a"));
    }

    #[test]
    fn unknown_name_without_fallback_is_none() {
        let reg = CommandRegistry::new();
        assert!(reg.lookup("sh").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unknown_name_found_on_search_path() {
        let reg = CommandRegistry::new().with_search_path("/nonexistent:/bin:/usr/bin");
        assert!(matches!(reg.lookup("sh"), Some(CommandKind::NamedCommand(n)) if n == "sh"));
        assert!(reg.lookup("no-such-binary-here").is_none());
    }
}
