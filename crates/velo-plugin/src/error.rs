//! Plugin error types.

/// Errors from plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A plugin with this name is already registered.
    #[error("plugin already registered: {0}")]
    AlreadyRegistered(String),

    /// The requested plugin was not found in the registry.
    #[error("plugin not found: {0}")]
    NotFound(String),

    /// One or more required preconditions failed.
    #[error("requirement check(s) failed: {details}")]
    RequirementsFailed {
        /// Every required failure, joined by `"; "`.
        details: String,
    },

    /// The plugin failed to start.
    #[error("plugin start failed: {0}")]
    StartFailed(String),

    /// The plugin failed to stop cleanly.
    #[error("plugin stop failed: {0}")]
    StopFailed(String),

    /// A task executor operation failed.
    #[error("executor error: {0}")]
    Executor(String),

    /// A state manager operation failed.
    #[error("state error: {0}")]
    State(String),
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
