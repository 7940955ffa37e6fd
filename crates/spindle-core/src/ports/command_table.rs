//! CommandTable port - what a command name refers to.

use std::fmt;
use std::sync::Arc;

use super::procedure::Procedure;

/// Kind of a named command.
#[derive(Clone)]
pub enum CommandKind {
    /// Another name to resolve in turn.
    AliasOf(String),
    /// A user-defined procedure run inside the worker.
    InlineProcedure(Arc<dyn Procedure>),
    /// An external program (or any other runnable) invoked by name.
    NamedCommand(String),
}

impl fmt::Debug for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::AliasOf(target) => f.debug_tuple("AliasOf").field(target).finish(),
            CommandKind::InlineProcedure(_) => f.write_str("InlineProcedure(..)"),
            CommandKind::NamedCommand(name) => f.debug_tuple("NamedCommand").field(name).finish(),
        }
    }
}

/// Lookup table consulted by the resolver.
///
/// `None` means "unknown name"; the resolver decides what that yields.
pub trait CommandTable: Send + Sync {
    fn lookup(&self, name: &str) -> Option<CommandKind>;
}
