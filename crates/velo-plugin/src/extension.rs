//! Typed plugin capabilities.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use velo_config::Mode;

use crate::error::PluginResult;
use crate::task::{ExecutorStatus, Task};

/// What kind of capability an extension provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    /// Registers commands with the command registry.
    Command,
    /// Executes tasks on behalf of the daemon.
    Executor,
    /// Persists and restores key/value state.
    State,
    /// Bridges an interaction surface (stdin, socket, ...).
    Channel,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Command => "command",
            Self::Executor => "executor",
            Self::State => "state",
            Self::Channel => "channel",
        };
        f.write_str(s)
    }
}

/// A single capability advertised by a plugin.
///
/// Implementations also implement the trait matching their
/// [`kind`](Extension::kind) ([`Executor`], [`StateManager`]); downcasting
/// goes through the `as_*` hooks rather than `Any`.
pub trait Extension: Send + Sync {
    /// The capability this extension provides.
    fn kind(&self) -> ExtensionKind;

    /// Human-readable extension name, used in logs and conflicts.
    fn name(&self) -> &str;

    /// Whether this extension is usable in the given mode.
    ///
    /// Defaults to `true` for every mode.
    fn supports_mode(&self, _mode: Mode) -> bool {
        true
    }

    /// View this extension as a task executor, if it is one.
    fn as_executor(self: Arc<Self>) -> Option<Arc<dyn Executor>> {
        None
    }

    /// View this extension as a state manager, if it is one.
    fn as_state_manager(self: Arc<Self>) -> Option<Arc<dyn StateManager>> {
        None
    }
}

impl fmt::Debug for dyn Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// A task executor.
///
/// The daemon enforces single-flight: it never calls
/// [`execute_task`](Executor::execute_task) while a previous call is still
/// running.
#[async_trait]
pub trait Executor: Extension {
    /// Run a task to completion.
    ///
    /// Implementations should watch `cancel` and return promptly once it
    /// fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the task fails or is cancelled mid-flight.
    async fn execute_task(&self, cancel: &CancellationToken, task: Task) -> PluginResult<()>;

    /// Request cancellation of the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if no such task is running or cancellation fails.
    async fn cancel_task(&self, task_id: &str) -> PluginResult<()>;

    /// The executor's current status.
    async fn status(&self) -> ExecutorStatus;
}

/// Key/value state persistence.
#[async_trait]
pub trait StateManager: Extension {
    /// Fetch a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn get(&self, key: &str) -> PluginResult<Option<serde_json::Value>>;

    /// Store a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn set(&self, key: &str, value: serde_json::Value) -> PluginResult<()>;

    /// Remove a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn delete(&self, key: &str) -> PluginResult<()>;

    /// Flush pending state to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    async fn save(&self) -> PluginResult<()>;

    /// Reload state from durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    async fn load(&self) -> PluginResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Extension for Probe {
        fn kind(&self) -> ExtensionKind {
            ExtensionKind::Channel
        }

        fn name(&self) -> &str {
            "probe"
        }
    }

    #[test]
    fn default_mode_support_is_universal() {
        let ext = Probe;
        assert!(ext.supports_mode(Mode::Daemon));
        assert!(ext.supports_mode(Mode::Interactive));
    }

    #[test]
    fn non_executor_downcasts_to_none() {
        let ext: Arc<dyn Extension> = Arc::new(Probe);
        assert!(ext.clone().as_executor().is_none());
        assert!(ext.as_state_manager().is_none());
    }

    #[test]
    fn kind_displays_lowercase() {
        assert_eq!(ExtensionKind::Executor.to_string(), "executor");
        assert_eq!(ExtensionKind::Channel.to_string(), "channel");
    }
}
