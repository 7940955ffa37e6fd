use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpindleError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("execution context pool is closed")]
    PoolClosed,

    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("{program}: failed to start: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program}: exited with status {code}")]
    ExitStatus { program: String, code: i32 },

    #[error("{0}")]
    Procedure(String),

    #[error("batch orchestrator failed: {0}")]
    Orchestrator(String),
}

impl SpindleError {
    pub fn procedure(message: impl Into<String>) -> Self {
        Self::Procedure(message.into())
    }

    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}
