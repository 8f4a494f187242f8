//! Daemon-facing handle exposed to commands and channels.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use velo_config::Mode;

use crate::task::{ExecutorStatus, Task};

/// The daemon's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonState {
    /// Started, no task in flight.
    Idle,
    /// A task is in flight.
    Working,
    /// Shut down; terminal.
    Stopped,
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A point-in-time snapshot of the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Lifecycle state.
    pub state: DaemonState,
    /// Execution mode.
    pub mode: Mode,
    /// Names of successfully started plugins, sorted.
    pub active_plugins: Vec<String>,
    /// The task currently in flight, if any.
    pub current_task: Option<Task>,
    /// The active executor's self-reported status, if one is installed.
    pub executor: Option<ExecutorStatus>,
}

/// What commands may ask of the running daemon.
///
/// This keeps the command layer decoupled from the daemon implementation;
/// errors cross this boundary as plain strings suitable for display.
#[async_trait]
pub trait DaemonHandle: Send + Sync {
    /// Snapshot the daemon's current status.
    async fn status(&self) -> DaemonStatus;

    /// Return the daemon to idle, best-effort cancelling any in-flight task.
    ///
    /// # Errors
    ///
    /// Returns a display-ready message if the daemon is not in a resettable
    /// state.
    async fn reset(&self) -> Result<(), String>;

    /// Submit a task for execution.
    ///
    /// # Errors
    ///
    /// Returns a display-ready message if the daemon is busy, stopped, or
    /// has no executor.
    async fn execute_task(&self, task: Task) -> Result<(), String>;
}
