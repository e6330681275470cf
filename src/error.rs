//! Error types for salesboard
//!
//! This module defines the error hierarchy used throughout the service.
//! We use `thiserror` for library-style errors with clear error chains.

use std::time::Duration;

/// Database operation errors
///
/// `Clone` because a single connection outcome is handed to every caller
/// that joined the same initialization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DbError {
    /// A single attempt to open the pool failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Every attempt of one initialization sequence failed
    #[error("Could not connect after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<DbError>,
    },

    /// Query execution failed at the engine
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Placeholders and parameter list do not line up
    #[error("Parameter binding failed: {0}")]
    Binding(String),

    /// Query did not finish within the request timeout
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
}

impl DbError {
    /// True for failures raised while acquiring the pool rather than
    /// while running a query on it
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::RetriesExhausted { .. }
        )
    }
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file not found
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
