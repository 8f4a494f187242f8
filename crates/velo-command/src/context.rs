//! Per-invocation command context.

use std::sync::Arc;

use velo_config::{Config, Mode};
use velo_plugin::DaemonHandle;

/// The values every command handler receives.
#[derive(Clone)]
pub struct CommandContext {
    /// The daemon's execution mode.
    pub mode: Mode,
    /// Handle back to the running daemon.
    pub daemon: Arc<dyn DaemonHandle>,
    /// The loaded configuration.
    pub config: Arc<Config>,
}

impl CommandContext {
    /// Create a context.
    #[must_use]
    pub fn new(mode: Mode, daemon: Arc<dyn DaemonHandle>, config: Arc<Config>) -> Self {
        Self {
            mode,
            daemon,
            config,
        }
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
