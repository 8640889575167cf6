//! Error types for the charm framework.

use thiserror::Error;

/// Result type alias using [`CharmError`].
pub type Result<T> = std::result::Result<T, CharmError>;

/// Errors that can occur while handling a hook.
#[derive(Error, Debug)]
pub enum CharmError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// An external command exited unsuccessfully.
    #[error("Command `{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// A host tool produced output that could not be interpreted.
    #[error("Unexpected output from {tool}: {message}")]
    HostOutput { tool: String, message: String },

    /// Malformed relation identifier.
    #[error("Invalid relation id: {0}")]
    RelationId(String),

    /// A relation hook ran without relation context.
    #[error("Hook {0} requires a relation but none was provided")]
    MissingRelation(String),

    /// Attempt to write a fact slot this unit does not own.
    #[error("Unit {local} cannot write the fact slot of {target}")]
    ForeignSlot { local: String, target: String },

    /// Hook environment is incomplete.
    #[error("Missing hook environment: {0}")]
    Environment(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CharmError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create a host output error.
    pub fn host_output(tool: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::HostOutput {
            tool: tool.into(),
            message: msg.into(),
        }
    }
}

impl From<serde_json::Error> for CharmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<charm_common::Error> for CharmError {
    fn from(err: charm_common::Error) -> Self {
        match err {
            charm_common::Error::Config(msg) => Self::ConfigParse(msg),
            charm_common::Error::Io(e) => Self::Io(e),
        }
    }
}
