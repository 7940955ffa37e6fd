//! Resolver - command reference → concrete unit of work.
//!
//! ```text
//! CommandRef::Name ──▶ CommandTable::lookup
//!                         ├─ AliasOf(target)     → recurse on target
//!                         ├─ InlineProcedure(p)  → WorkUnit::Procedure
//!                         ├─ NamedCommand(name)  → WorkUnit::External
//!                         └─ None                → WorkUnit::Empty
//! CommandRef::Procedure ────────────────────────▶ WorkUnit::Procedure
//! ```
//!
//! Resolution never fails: an unknown name becomes `WorkUnit::Empty`, which
//! fails when a worker runs it.

use std::fmt;
use std::sync::Arc;

use crate::domain::{Invocation, WorkerHost};
use crate::error::SpindleError;
use crate::impls::run_external;
use crate::ports::{CommandKind, CommandTable, Procedure};

/// Alias hops followed before a chain counts as unresolvable.
const MAX_ALIAS_DEPTH: usize = 32;

/// What the caller asks to run.
#[derive(Clone)]
pub enum CommandRef {
    Name(String),
    /// An already-resolved procedure, shown as `name` in command lines.
    Procedure {
        name: String,
        procedure: Arc<dyn Procedure>,
    },
}

impl CommandRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn procedure(name: impl Into<String>, procedure: Arc<dyn Procedure>) -> Self {
        Self::Procedure {
            name: name.into(),
            procedure,
        }
    }
}

impl fmt::Debug for CommandRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            CommandRef::Procedure { name, .. } => {
                f.debug_struct("Procedure").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

/// Concrete unit of work attached to a worker by the dispatcher.
#[derive(Clone)]
pub enum WorkUnit {
    Procedure {
        name: String,
        procedure: Arc<dyn Procedure>,
    },
    External {
        program: String,
    },
    /// Unresolvable reference; running it reports `CommandNotFound`.
    Empty {
        requested: String,
    },
}

impl WorkUnit {
    /// Name shown in the reconstructed command line.
    pub fn display_name(&self) -> &str {
        match self {
            WorkUnit::Procedure { name, .. } => name,
            WorkUnit::External { program } => program,
            WorkUnit::Empty { requested } => requested,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, WorkUnit::Empty { .. })
    }

    /// Execute inside a worker.
    pub async fn run(
        self,
        invocation: Invocation,
        host: WorkerHost,
    ) -> Result<Vec<serde_json::Value>, SpindleError> {
        match self {
            WorkUnit::Procedure { procedure, .. } => procedure.call(invocation, host).await,
            WorkUnit::External { program } => run_external(&program, &invocation, &host).await,
            WorkUnit::Empty { requested } => Err(SpindleError::CommandNotFound(requested)),
        }
    }
}

impl fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkUnit::Procedure { name, .. } => {
                f.debug_struct("Procedure").field("name", name).finish_non_exhaustive()
            }
            WorkUnit::External { program } => {
                f.debug_struct("External").field("program", program).finish()
            }
            WorkUnit::Empty { requested } => {
                f.debug_struct("Empty").field("requested", requested).finish()
            }
        }
    }
}

pub struct Resolver {
    table: Arc<dyn CommandTable>,
}

impl Resolver {
    pub fn new(table: Arc<dyn CommandTable>) -> Self {
        Self { table }
    }

    pub fn resolve(&self, command: &CommandRef) -> WorkUnit {
        match command {
            CommandRef::Procedure { name, procedure } => WorkUnit::Procedure {
                name: name.clone(),
                procedure: Arc::clone(procedure),
            },
            CommandRef::Name(name) => self.resolve_name(name, name, 0),
        }
    }

    fn resolve_name(&self, requested: &str, name: &str, depth: usize) -> WorkUnit {
        if depth > MAX_ALIAS_DEPTH {
            tracing::debug!(requested, depth, "alias chain too deep, treating as unresolved");
            return WorkUnit::Empty {
                requested: requested.to_string(),
            };
        }

        match self.table.lookup(name) {
            Some(CommandKind::AliasOf(target)) => self.resolve_name(requested, &target, depth + 1),
            Some(CommandKind::InlineProcedure(procedure)) => WorkUnit::Procedure {
                name: name.to_string(),
                procedure,
            },
            Some(CommandKind::NamedCommand(program)) => WorkUnit::External { program },
            None => {
                tracing::debug!(requested, "command did not resolve");
                WorkUnit::Empty {
                    requested: requested.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StreamPreferences;
    use crate::impls::{CommandRegistry, procedure_fn};
    use serde_json::json;

    fn registry() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        reg.register_procedure(
            "Get-Echo",
            procedure_fn(|inv, _| async move { Ok(inv.positional(0).cloned().into_iter().collect()) }),
        )
        .unwrap();
        reg.register_alias("echo2", "echo1").unwrap();
        reg.register_alias("echo1", "Get-Echo").unwrap();
        reg.register_external("ping", "/usr/bin/ping").unwrap();
        reg.register_alias("loop-a", "loop-b").unwrap();
        reg.register_alias("loop-b", "loop-a").unwrap();
        reg
    }

    #[test]
    fn aliases_resolve_recursively_to_the_target_procedure() {
        let resolver = Resolver::new(Arc::new(registry()));
        let unit = resolver.resolve(&CommandRef::name("echo2"));
        assert!(matches!(unit, WorkUnit::Procedure { ref name, .. } if name == "Get-Echo"));
    }

    #[test]
    fn named_commands_are_left_as_is() {
        let resolver = Resolver::new(Arc::new(registry()));
        let unit = resolver.resolve(&CommandRef::name("ping"));
        assert!(matches!(unit, WorkUnit::External { ref program } if program == "/usr/bin/ping"));
    }

    #[test]
    fn unknown_names_yield_an_empty_unit() {
        let resolver = Resolver::new(Arc::new(registry()));
        let unit = resolver.resolve(&CommandRef::name("nope"));
        assert!(unit.is_empty());
        assert_eq!(unit.display_name(), "nope");
    }

    #[test]
    fn alias_cycles_end_as_empty_instead_of_recursing_forever() {
        let resolver = Resolver::new(Arc::new(registry()));
        assert!(resolver.resolve(&CommandRef::name("loop-a")).is_empty());
    }

    #[test]
    fn pre_resolved_procedures_pass_through() {
        let resolver = Resolver::new(Arc::new(CommandRegistry::new()));
        let proc = procedure_fn(|_, _| async { Ok(vec![]) });
        let unit = resolver.resolve(&CommandRef::procedure("inline", proc));
        assert_eq!(unit.display_name(), "inline");
        assert!(!unit.is_empty());
    }

    #[tokio::test]
    async fn running_an_empty_unit_fails_with_command_not_found() {
        let unit = WorkUnit::Empty {
            requested: "ghost".to_string(),
        };
        let host = WorkerHost::new(0, StreamPreferences::all_continue());
        let err = unit.run(Invocation::new("ghost"), host).await.unwrap_err();
        assert!(matches!(err, SpindleError::CommandNotFound(n) if n == "ghost"));
    }

    #[tokio::test]
    async fn running_a_procedure_unit_calls_it() {
        let resolver = Resolver::new(Arc::new(registry()));
        let unit = resolver.resolve(&CommandRef::name("echo1"));
        let mut inv = Invocation::new("Get-Echo");
        inv.push_positional(json!("hi"));
        let host = WorkerHost::new(0, StreamPreferences::all_continue());
        assert_eq!(unit.run(inv, host).await.unwrap(), vec![json!("hi")]);
    }
}
