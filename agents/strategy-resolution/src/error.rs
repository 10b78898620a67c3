//! Error types for the Strategy Resolution Agent
//!
//! Wraps resolution errors from the core crate together with the I/O,
//! parsing and configuration failures that only the agent surfaces.

use deploy_strategy_core::StrategyError;
use thiserror::Error;

/// Main error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Resolution or catalog failure from the engine
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Request or profile document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Agent configuration is unusable
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error while rendering output
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Structured error returned by a remote agent
    #[error("{code}: {message}")]
    Remote { code: String, message: String },

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AgentError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AgentError::InvalidInput(msg.into())
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        AgentError::FileError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        AgentError::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AgentError::InternalError(msg.into())
    }

    /// The wrapped engine error, if any
    pub fn as_strategy(&self) -> Option<&StrategyError> {
        match self {
            AgentError::Strategy(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            AgentError::InternalError(_) | AgentError::SerializationError(_)
        )
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AgentError {
    fn from(err: serde_yaml::Error) -> Self {
        AgentError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for AgentError {
    fn from(err: toml::de::Error) -> Self {
        AgentError::ParseError(format!("TOML error: {}", err))
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
