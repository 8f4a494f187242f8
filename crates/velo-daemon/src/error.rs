//! Daemon error types.

use velo_plugin::DaemonState;

/// Errors from daemon lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// The daemon has already been started (or has been stopped; a stopped
    /// daemon is terminal).
    #[error("daemon already started")]
    AlreadyStarted,

    /// The daemon has been stopped.
    #[error("daemon is stopped")]
    Stopped,

    /// A plugin with this name was already added.
    #[error("plugin already added: {0}")]
    PluginAlreadyAdded(String),

    /// The operation needs an idle daemon.
    #[error("daemon is busy (state: {0})")]
    NotIdle(DaemonState),

    /// The operation needs a working daemon.
    #[error("no task in progress (state: {0})")]
    NotWorking(DaemonState),

    /// No started plugin provides an executor.
    #[error("no executor available")]
    NoExecutor,

    /// Two started plugins both provide an executor.
    #[error("conflicting executors: {existing} and {conflicting}")]
    ExecutorConflict {
        /// Plugin whose executor was discovered first.
        existing: String,
        /// Plugin whose executor collided with it.
        conflicting: String,
    },
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_blocking_state() {
        assert_eq!(
            DaemonError::NotIdle(DaemonState::Working).to_string(),
            "daemon is busy (state: working)"
        );
        assert_eq!(
            DaemonError::NotWorking(DaemonState::Stopped).to_string(),
            "no task in progress (state: stopped)"
        );
        assert_eq!(
            DaemonError::ExecutorConflict {
                existing: "alpha".to_owned(),
                conflicting: "beta".to_owned(),
            }
            .to_string(),
            "conflicting executors: alpha and beta"
        );
    }
}
