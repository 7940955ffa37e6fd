//! Invocation - the command line attached to a worker.

use serde::{Deserialize, Serialize};

/// One argument of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Argument {
    Positional { value: serde_json::Value },
    Named { name: String, value: serde_json::Value },
    /// A standalone switch with no value.
    Flag { name: String },
}

/// The command name plus its arguments, in attach order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    command: String,
    arguments: Vec<Argument>,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments: Vec::new(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Drop every argument and rebind to `command`.
    pub fn reset(&mut self, command: impl Into<String>) {
        self.command = command.into();
        self.arguments.clear();
    }

    pub fn push_positional(&mut self, value: serde_json::Value) {
        self.arguments.push(Argument::Positional { value });
    }

    pub fn push_named(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.arguments.push(Argument::Named {
            name: name.into(),
            value,
        });
    }

    pub fn push_flag(&mut self, name: impl Into<String>) {
        self.arguments.push(Argument::Flag { name: name.into() });
    }

    /// The `n`-th positional argument.
    pub fn positional(&self, n: usize) -> Option<&serde_json::Value> {
        self.arguments
            .iter()
            .filter_map(|arg| match arg {
                Argument::Positional { value } => Some(value),
                _ => None,
            })
            .nth(n)
    }

    pub fn named(&self, name: &str) -> Option<&serde_json::Value> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Named { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.arguments
            .iter()
            .any(|arg| matches!(arg, Argument::Flag { name: n } if n == name))
    }

    /// Human-readable reconstruction, e.g. `ping 'host1' -Name 'X' -Verbose`.
    pub fn command_line(&self) -> String {
        let mut line = self.command.clone();
        for arg in &self.arguments {
            line.push(' ');
            match arg {
                Argument::Positional { value } => line.push_str(&quote(value)),
                Argument::Named { name, value } => {
                    line.push('-');
                    line.push_str(name);
                    line.push(' ');
                    line.push_str(&quote(value));
                }
                Argument::Flag { name } => {
                    line.push('-');
                    line.push_str(name);
                }
            }
        }
        line
    }

    /// Flat argv for an external program.
    ///
    /// Named arguments become `-Name value` pairs, flags become `-Flag`.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.arguments.len());
        for arg in &self.arguments {
            match arg {
                Argument::Positional { value } => argv.push(plain(value)),
                Argument::Named { name, value } => {
                    argv.push(format!("-{name}"));
                    argv.push(plain(value));
                }
                Argument::Flag { name } => argv.push(format!("-{name}")),
            }
        }
        argv
    }
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quote(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        serde_json::Value::Number(_) | serde_json::Value::Bool(_) => value.to_string(),
        serde_json::Value::Null => "$null".to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
