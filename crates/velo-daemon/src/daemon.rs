//! The daemon state machine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use velo_broker::{Broker, Message, TOPIC_NOTIFICATION};
use velo_config::Config;
use velo_plugin::{
    DaemonHandle, DaemonState, DaemonStatus, Executor, Plugin, StartupContext, Task,
};

use crate::error::{DaemonError, DaemonResult};

/// Upper bound on how long [`Daemon::stop`] waits for background work.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

struct DaemonInner {
    state: DaemonState,
    started: bool,
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
    executor: Option<(String, Arc<dyn Executor>)>,
    current_task: Option<Task>,
    task_cancel: Option<CancellationToken>,
}

/// The daemon: plugin admission, requirement gating, single-flight task
/// execution, and graceful shutdown over one shared [`Broker`].
///
/// Lifecycle: add plugins, [`start`](Daemon::start) once, run, then
/// [`stop`](Daemon::stop). A stopped daemon is terminal; restarting means
/// constructing a new one.
pub struct Daemon {
    inner: Arc<Mutex<DaemonInner>>,
    broker: Arc<Broker>,
    config: Arc<Config>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Daemon {
    /// Create a daemon over a fresh broker.
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DaemonInner {
                state: DaemonState::Idle,
                started: false,
                plugins: BTreeMap::new(),
                executor: None,
                current_task: None,
                task_cancel: None,
            })),
            broker: Arc::new(Broker::new()),
            config,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// The daemon's broker.
    #[must_use]
    pub fn broker(&self) -> Arc<Broker> {
        Arc::clone(&self.broker)
    }

    /// The daemon's configuration.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The root shutdown token, cancelled by [`stop`](Daemon::stop).
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> DaemonState {
        self.inner.lock().await.state
    }

    /// Names of the admitted (before start) or active (after start)
    /// plugins, sorted.
    pub async fn plugins(&self) -> Vec<String> {
        self.inner.lock().await.plugins.keys().cloned().collect()
    }

    /// Admit a plugin for the next [`start`](Daemon::start).
    ///
    /// A plugin disabled in configuration is silently skipped: the call
    /// succeeds but records nothing.
    ///
    /// # Errors
    ///
    /// [`DaemonError::AlreadyStarted`] once the daemon has started,
    /// [`DaemonError::Stopped`] after it has stopped, and
    /// [`DaemonError::PluginAlreadyAdded`] on a duplicate name.
    pub async fn add_plugin(&self, plugin: Arc<dyn Plugin>) -> DaemonResult<()> {
        let name = plugin.name().to_owned();
        if !self.config.is_plugin_enabled(&name) {
            info!(plugin = %name, "Plugin disabled by configuration; skipping");
            return Ok(());
        }

        let mut inner = self.inner.lock().await;
        if inner.state == DaemonState::Stopped {
            return Err(DaemonError::Stopped);
        }
        if inner.started {
            return Err(DaemonError::AlreadyStarted);
        }
        if inner.plugins.contains_key(&name) {
            return Err(DaemonError::PluginAlreadyAdded(name));
        }
        info!(plugin = %name, "Plugin added");
        inner.plugins.insert(name, plugin);
        Ok(())
    }

    /// Start the daemon.
    ///
    /// Plugins are processed in name order. A plugin whose requirements
    /// fail, or whose `start` errors, is dropped with a warning; the daemon
    /// runs with whatever subset survived. At most one surviving plugin may
    /// advertise an executor.
    ///
    /// # Errors
    ///
    /// [`DaemonError::AlreadyStarted`] on a second call (a stopped daemon
    /// included), and [`DaemonError::ExecutorConflict`] when two admitted
    /// plugins both advertise an executor — detected before any plugin is
    /// started, so a conflicting configuration has no side effects.
    pub async fn start(&self) -> DaemonResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.started || inner.state == DaemonState::Stopped {
            return Err(DaemonError::AlreadyStarted);
        }

        self.broker
            .set_publish_timeout(Duration::from_secs(self.config.daemon.publish_timeout_secs))
            .await;

        let ctx = StartupContext::with_shutdown(
            self.config.mode,
            Arc::clone(&self.config),
            self.shutdown.clone(),
        );

        let admitted = std::mem::take(&mut inner.plugins);

        // Requirement gating first, then the executor-conflict scan, and
        // only then plugin startup. Conflicts are detected before anything
        // runs.
        let mut eligible = BTreeMap::new();
        for (name, plugin) in admitted {
            match plugin.check_requirements(&ctx) {
                Ok(()) => {
                    eligible.insert(name, plugin);
                }
                Err(e) => {
                    warn!(plugin = %name, error = %e, "Plugin requirements not met; skipping");
                }
            }
        }

        let mut executor_owner: Option<String> = None;
        let mut conflict: Option<(String, String)> = None;
        for (name, plugin) in &eligible {
            let has_executor = plugin.extensions().iter().any(|ext| {
                ext.supports_mode(self.config.mode) && Arc::clone(ext).as_executor().is_some()
            });
            if has_executor {
                match &executor_owner {
                    Some(existing) => {
                        conflict = Some((existing.clone(), name.clone()));
                        break;
                    }
                    None => executor_owner = Some(name.clone()),
                }
            }
        }
        if let Some((existing, conflicting)) = conflict {
            inner.plugins = eligible;
            return Err(DaemonError::ExecutorConflict {
                existing,
                conflicting,
            });
        }

        let mut active = BTreeMap::new();
        for (name, plugin) in eligible {
            match plugin.start(&ctx, Arc::clone(&self.broker)).await {
                Ok(()) => {
                    info!(plugin = %name, "Plugin started");
                    active.insert(name, plugin);
                }
                Err(e) => {
                    warn!(plugin = %name, error = %e, "Plugin failed to start; dropping");
                }
            }
        }

        inner.executor = executor_owner.and_then(|owner| {
            // The owning plugin may itself have failed to start.
            let plugin = active.get(&owner)?;
            let exec = plugin.extensions().into_iter().find_map(|ext| {
                if ext.supports_mode(self.config.mode) {
                    ext.as_executor()
                } else {
                    None
                }
            })?;
            Some((owner, exec))
        });

        info!(
            plugins = active.len(),
            executor = inner.executor.as_ref().map(|(name, _)| name.as_str()),
            mode = %self.config.mode,
            "Daemon started"
        );
        inner.plugins = active;
        inner.started = true;
        inner.state = DaemonState::Idle;
        Ok(())
    }

    /// Submit a task for execution.
    ///
    /// The executor runs on a background task; this call returns as soon as
    /// the task is recorded. On completion a `notification` message is
    /// published and the daemon returns to idle, whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`DaemonError::NotIdle`] while a task is in flight or after stop,
    /// and [`DaemonError::NoExecutor`] when no started plugin provides one.
    pub async fn execute_task(&self, task: Task) -> DaemonResult<()> {
        let (executor, cancel) = {
            let mut inner = self.inner.lock().await;
            if inner.state != DaemonState::Idle {
                return Err(DaemonError::NotIdle(inner.state));
            }
            let Some((_, executor)) = inner.executor.clone() else {
                return Err(DaemonError::NoExecutor);
            };
            let cancel = self.shutdown.child_token();
            inner.state = DaemonState::Working;
            inner.current_task = Some(task.clone());
            inner.task_cancel = Some(cancel.clone());
            (executor, cancel)
        };

        info!(task = %task.id, kind = %task.kind, "Task started");

        let inner = Arc::clone(&self.inner);
        let broker = Arc::clone(&self.broker);
        let shutdown = self.shutdown.clone();
        let task_id = task.id.clone();
        self.tracker.spawn(async move {
            let result = executor.execute_task(&cancel, task).await;
            let note = match &result {
                Ok(()) => "Task completed successfully".to_owned(),
                Err(e) => format!("Task failed: {e}"),
            };
            let message = Message::text(TOPIC_NOTIFICATION, "daemon", note);
            if let Err(e) = broker.publish(&shutdown, message).await {
                warn!(task = %task_id, error = %e, "Failed to publish task notification");
            }

            let mut inner = inner.lock().await;
            // A reset or stop may have moved the daemon on; only the task
            // that is still current releases the slot.
            if inner.state == DaemonState::Working
                && inner.current_task.as_ref().is_some_and(|t| t.id == task_id)
            {
                inner.state = DaemonState::Idle;
                inner.current_task = None;
                inner.task_cancel = None;
            }
        });
        Ok(())
    }

    /// Cancel the in-flight task and return to idle.
    ///
    /// Cancellation is best-effort: the per-task token is cancelled and the
    /// executor's own `cancel_task` is invoked, but its failure only logs —
    /// the daemon goes back to idle regardless.
    ///
    /// # Errors
    ///
    /// [`DaemonError::NotWorking`] when no task is in flight.
    pub async fn reset(&self) -> DaemonResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != DaemonState::Working {
            return Err(DaemonError::NotWorking(inner.state));
        }

        if let Some(cancel) = inner.task_cancel.take() {
            cancel.cancel();
        }
        if let (Some(task), Some((name, executor))) =
            (inner.current_task.clone(), inner.executor.clone())
        {
            if let Err(e) = executor.cancel_task(&task.id).await {
                warn!(
                    plugin = %name,
                    task = %task.id,
                    error = %e,
                    "Task cancellation failed; resetting anyway"
                );
            }
        }

        inner.state = DaemonState::Idle;
        inner.current_task = None;
        info!("Daemon reset to idle");
        Ok(())
    }

    /// Stop the daemon. Idempotent; a stopped daemon is terminal.
    ///
    /// Cancels the root token, stops every plugin (errors logged, never
    /// propagated), closes the broker, then waits for background work
    /// bounded by [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub async fn stop(&self) {
        let plugins = {
            let mut inner = self.inner.lock().await;
            if inner.state == DaemonState::Stopped {
                return;
            }
            inner.state = DaemonState::Stopped;
            inner.current_task = None;
            inner.task_cancel = None;
            inner.executor = None;
            std::mem::take(&mut inner.plugins)
        };

        self.shutdown.cancel();

        for (name, plugin) in plugins {
            match plugin.stop().await {
                Ok(()) => info!(plugin = %name, "Plugin stopped"),
                Err(e) => warn!(plugin = %name, error = %e, "Plugin stop failed"),
            }
        }

        self.broker.close().await;

        self.tracker.close();
        if tokio::time::timeout(DEFAULT_SHUTDOWN_TIMEOUT, self.tracker.wait())
            .await
            .is_err()
        {
            warn!("Shutdown deadline elapsed with background work still running");
        }
        info!("Daemon stopped");
    }

    /// A point-in-time status snapshot.
    pub async fn status(&self) -> DaemonStatus {
        let (state, active_plugins, current_task, executor) = {
            let inner = self.inner.lock().await;
            (
                inner.state,
                inner.plugins.keys().cloned().collect(),
                inner.current_task.clone(),
                inner.executor.clone(),
            )
        };

        let executor = match executor {
            Some((_, exec)) => Some(exec.status().await),
            None => None,
        };

        DaemonStatus {
            state,
            mode: self.config.mode,
            active_plugins,
            current_task,
            executor,
        }
    }
}

#[async_trait]
impl DaemonHandle for Daemon {
    async fn status(&self) -> DaemonStatus {
        Self::status(self).await
    }

    async fn reset(&self) -> Result<(), String> {
        Self::reset(self).await.map_err(|e| e.to_string())
    }

    async fn execute_task(&self, task: Task) -> Result<(), String> {
        Self::execute_task(self, task).await.map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("mode", &self.config.mode)
            .finish_non_exhaustive()
    }
}
