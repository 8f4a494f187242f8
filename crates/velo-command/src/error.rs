//! Command error types.

use velo_config::Mode;

/// Errors from parsing, resolving, or running commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The input was empty or whitespace only.
    #[error("empty command")]
    Empty,

    /// The input could not be parsed into a command.
    #[error("invalid command format")]
    Invalid,

    /// No command with this name is registered.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// The command exists but not in the current mode.
    #[error("command /{name} not available in {mode} mode")]
    NotAvailable {
        /// The command name.
        name: String,
        /// The mode the daemon is running in.
        mode: Mode,
    },

    /// A command with this name is already registered.
    #[error("command already registered: {0}")]
    AlreadyRegistered(String),

    /// The command handler failed.
    #[error("{0}")]
    Handler(String),

    /// The daemon rejected the request.
    #[error("{0}")]
    Daemon(String),
}

impl CommandError {
    /// A display-ready message for interaction surfaces.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("Error: {self}")
    }
}

/// Result type for command operations.
pub type CommandResult<T> = Result<T, CommandError>;
