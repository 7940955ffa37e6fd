//! Per-stream visibility preferences of a worker host.

use serde::{Deserialize, Serialize};

use super::diagnostic::Stream;

/// What a worker host does with a message written to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPreference {
    /// Buffer the message so it is forwarded at harvest.
    Continue,
    /// Drop the message.
    SilentlyContinue,
}

/// Visibility of each diagnostic stream inside one execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPreferences {
    pub debug: ActionPreference,
    pub verbose: ActionPreference,
    pub warning: ActionPreference,
    pub information: ActionPreference,
    pub error: ActionPreference,
}

impl StreamPreferences {
    /// What a freshly created context starts with: verbose, debug and
    /// information are muted.
    pub fn host_defaults() -> Self {
        Self {
            debug: ActionPreference::SilentlyContinue,
            verbose: ActionPreference::SilentlyContinue,
            warning: ActionPreference::Continue,
            information: ActionPreference::SilentlyContinue,
            error: ActionPreference::Continue,
        }
    }

    /// Every stream buffered.
    pub fn all_continue() -> Self {
        Self {
            debug: ActionPreference::Continue,
            verbose: ActionPreference::Continue,
            warning: ActionPreference::Continue,
            information: ActionPreference::Continue,
            error: ActionPreference::Continue,
        }
    }

    pub fn for_stream(&self, stream: Stream) -> ActionPreference {
        match stream {
            Stream::Verbose => self.verbose,
            Stream::Debug => self.debug,
            Stream::Warning => self.warning,
            Stream::Information => self.information,
            Stream::Error => self.error,
        }
    }

    pub fn allows(&self, stream: Stream) -> bool {
        self.for_stream(stream) == ActionPreference::Continue
    }
}

impl Default for StreamPreferences {
    fn default() -> Self {
        Self::all_continue()
    }
}
