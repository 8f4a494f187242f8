//! Typed startup context passed to plugins.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use velo_config::{Config, Mode};

/// The request-scope values a plugin sees during requirement checks and
/// startup: the execution mode, the configuration handle, and the daemon's
/// shutdown signal.
///
/// Plugins are expected to observe [`shutdown`](Self::shutdown) from their
/// background loops — there is no forced-termination primitive.
#[derive(Debug, Clone)]
pub struct StartupContext {
    /// The daemon's execution mode.
    pub mode: Mode,
    /// The loaded configuration.
    pub config: Arc<Config>,
    /// Cancelled when the daemon stops.
    pub shutdown: CancellationToken,
}

impl StartupContext {
    /// Create a context with a fresh (never-cancelled) shutdown token.
    #[must_use]
    pub fn new(mode: Mode, config: Arc<Config>) -> Self {
        Self {
            mode,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a context tied to an existing shutdown token.
    #[must_use]
    pub fn with_shutdown(mode: Mode, config: Arc<Config>, shutdown: CancellationToken) -> Self {
        Self {
            mode,
            config,
            shutdown,
        }
    }

    /// The configured queue capacity plugins should pass to
    /// `Broker::subscribe` unless they have a reason to pick their own
    /// (`daemon.broker_buffer_size` in the configuration file).
    #[must_use]
    pub fn subscription_capacity(&self) -> usize {
        self.config.daemon.broker_buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_capacity_comes_from_the_config() {
        let mut config = Config::default();
        config.daemon.broker_buffer_size = 32;
        let ctx = StartupContext::new(Mode::Daemon, Arc::new(config));
        assert_eq!(ctx.subscription_capacity(), 32);

        let ctx = StartupContext::new(Mode::Daemon, Arc::new(Config::default()));
        assert_eq!(ctx.subscription_capacity(), 100);
    }
}
