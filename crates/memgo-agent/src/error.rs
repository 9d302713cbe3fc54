//! Error types for the agent

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error
///
/// Always fatal: the agent exits before the monitoring loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that stop the agent from starting
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),
}
