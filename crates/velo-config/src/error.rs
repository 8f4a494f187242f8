//! Configuration error types.

use std::path::PathBuf;

/// Errors from configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file as TOML.
    #[error("failed to parse config at {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Failed to serialize the configuration back to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(String),

    /// The execution mode string is not recognized.
    #[error("invalid mode: {0} (must be 'daemon' or 'interactive')")]
    InvalidMode(String),

    /// The configured log level is not recognized.
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    /// A numeric field is outside its valid range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending configuration field.
        field: &'static str,
        /// Why the value is rejected.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
