//! Telemetry error types.

/// Errors from logging setup.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The logging configuration is invalid.
    #[error("invalid logging configuration: {0}")]
    Config(String),

    /// The global subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Init(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
