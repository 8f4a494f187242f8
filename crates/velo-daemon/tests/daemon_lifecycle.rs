//! End-to-end daemon lifecycle tests with in-process test plugins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use velo_broker::{Broker, TOPIC_NOTIFICATION};
use velo_config::{Config, PluginConfig};
use velo_daemon::{Daemon, DaemonError};
use velo_plugin::{
    DaemonState, Executor, ExecutorStatus, Extension, ExtensionKind, Plugin, PluginError,
    PluginResult, StartupContext, Task,
};

/// An executor that runs until released (or cancelled).
struct BlockingExecutor {
    release: Arc<Notify>,
    cancel_fails: bool,
    cancel_requested: AtomicBool,
}

impl BlockingExecutor {
    fn new(cancel_fails: bool) -> Arc<Self> {
        Arc::new(Self {
            release: Arc::new(Notify::new()),
            cancel_fails,
            cancel_requested: AtomicBool::new(false),
        })
    }
}

impl Extension for BlockingExecutor {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Executor
    }

    fn name(&self) -> &str {
        "blocking"
    }

    fn as_executor(self: Arc<Self>) -> Option<Arc<dyn Executor>> {
        Some(self)
    }
}

#[async_trait]
impl Executor for BlockingExecutor {
    async fn execute_task(&self, cancel: &CancellationToken, _task: Task) -> PluginResult<()> {
        tokio::select! {
            () = self.release.notified() => Ok(()),
            () = cancel.cancelled() => Err(PluginError::Executor("task cancelled".to_owned())),
        }
    }

    async fn cancel_task(&self, _task_id: &str) -> PluginResult<()> {
        self.cancel_requested.store(true, Ordering::SeqCst);
        if self.cancel_fails {
            Err(PluginError::Executor("cancel unsupported".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn status(&self) -> ExecutorStatus {
        ExecutorStatus::idle()
    }
}

/// A plugin with scriptable requirement and startup outcomes.
struct TestPlugin {
    name: &'static str,
    requirements_fail: bool,
    start_fails: bool,
    extensions: Vec<Arc<dyn Extension>>,
    stopped: AtomicBool,
}

impl TestPlugin {
    fn passing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            requirements_fail: false,
            start_fails: false,
            extensions: Vec::new(),
            stopped: AtomicBool::new(false),
        })
    }

    fn failing_requirements(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            requirements_fail: true,
            start_fails: false,
            extensions: Vec::new(),
            stopped: AtomicBool::new(false),
        })
    }

    fn failing_start(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            requirements_fail: false,
            start_fails: true,
            extensions: Vec::new(),
            stopped: AtomicBool::new(false),
        })
    }

    fn with_executor(name: &'static str, executor: Arc<BlockingExecutor>) -> Arc<Self> {
        Arc::new(Self {
            name,
            requirements_fail: false,
            start_fails: false,
            extensions: vec![executor],
            stopped: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Plugin for TestPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn check_requirements(&self, _ctx: &StartupContext) -> PluginResult<()> {
        if self.requirements_fail {
            Err(PluginError::RequirementsFailed {
                details: "scripted failure".to_owned(),
            })
        } else {
            Ok(())
        }
    }

    fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        self.extensions.clone()
    }

    async fn start(&self, _ctx: &StartupContext, _broker: Arc<Broker>) -> PluginResult<()> {
        if self.start_fails {
            Err(PluginError::StartFailed("scripted failure".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn stop(&self) -> PluginResult<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn daemon() -> Daemon {
    Daemon::new(Arc::new(Config::default()))
}

async fn wait_for_idle(daemon: &Daemon) {
    for _ in 0..100 {
        if daemon.state().await == DaemonState::Idle {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("daemon never returned to idle");
}

#[tokio::test]
async fn startup_runs_with_the_passing_subset() {
    let daemon = daemon();
    daemon.add_plugin(TestPlugin::passing("alpha")).await.unwrap();
    daemon
        .add_plugin(TestPlugin::failing_requirements("beta"))
        .await
        .unwrap();
    daemon
        .add_plugin(TestPlugin::failing_start("gamma"))
        .await
        .unwrap();

    daemon.start().await.unwrap();

    assert_eq!(daemon.state().await, DaemonState::Idle);
    assert_eq!(daemon.plugins().await, vec!["alpha"]);
}

#[tokio::test]
async fn disabled_plugins_are_never_admitted() {
    let mut config = Config::default();
    config.plugins.insert(
        "alpha".to_owned(),
        PluginConfig {
            enabled: false,
            ..PluginConfig::default()
        },
    );
    let daemon = Daemon::new(Arc::new(config));

    daemon.add_plugin(TestPlugin::passing("alpha")).await.unwrap();
    daemon.add_plugin(TestPlugin::passing("delta")).await.unwrap();
    daemon.start().await.unwrap();

    assert_eq!(daemon.plugins().await, vec!["delta"]);
}

#[tokio::test]
async fn duplicate_plugin_names_are_rejected() {
    let daemon = daemon();
    daemon.add_plugin(TestPlugin::passing("alpha")).await.unwrap();
    let err = daemon
        .add_plugin(TestPlugin::passing("alpha"))
        .await
        .unwrap_err();
    assert!(matches!(err, DaemonError::PluginAlreadyAdded(name) if name == "alpha"));
}

#[tokio::test]
async fn add_plugin_after_start_fails() {
    let daemon = daemon();
    daemon.start().await.unwrap();
    let err = daemon
        .add_plugin(TestPlugin::passing("late"))
        .await
        .unwrap_err();
    assert!(matches!(err, DaemonError::AlreadyStarted));
}

#[tokio::test]
async fn two_executors_fail_startup_deterministically() {
    let daemon = daemon();
    daemon
        .add_plugin(TestPlugin::with_executor("beta", BlockingExecutor::new(false)))
        .await
        .unwrap();
    daemon
        .add_plugin(TestPlugin::with_executor("alpha", BlockingExecutor::new(false)))
        .await
        .unwrap();

    let err = daemon.start().await.unwrap_err();
    match err {
        DaemonError::ExecutorConflict {
            existing,
            conflicting,
        } => {
            // Name order, not insertion order.
            assert_eq!(existing, "alpha");
            assert_eq!(conflicting, "beta");
        }
        other => panic!("expected executor conflict, got {other}"),
    }
}

#[tokio::test]
async fn execute_task_is_single_flight() {
    let daemon = daemon();
    let executor = BlockingExecutor::new(false);
    daemon
        .add_plugin(TestPlugin::with_executor("exec", Arc::clone(&executor)))
        .await
        .unwrap();
    daemon.start().await.unwrap();

    daemon.execute_task(Task::new("chat", "first")).await.unwrap();
    assert_eq!(daemon.state().await, DaemonState::Working);

    let err = daemon
        .execute_task(Task::new("chat", "second"))
        .await
        .unwrap_err();
    assert!(matches!(err, DaemonError::NotIdle(DaemonState::Working)));

    executor.release.notify_one();
    wait_for_idle(&daemon).await;

    // The slot is free again.
    daemon.execute_task(Task::new("chat", "third")).await.unwrap();
    executor.release.notify_one();
    wait_for_idle(&daemon).await;
}

#[tokio::test]
async fn task_completion_publishes_a_notification() {
    let daemon = daemon();
    let executor = BlockingExecutor::new(false);
    daemon
        .add_plugin(TestPlugin::with_executor("exec", Arc::clone(&executor)))
        .await
        .unwrap();
    daemon.start().await.unwrap();

    let broker = daemon.broker();
    let mut rx = broker.subscribe("watcher", 4, [TOPIC_NOTIFICATION]).await;

    daemon.execute_task(Task::new("chat", "hello")).await.unwrap();
    executor.release.notify_one();

    let message = rx.recv().await.expect("notification expected");
    assert_eq!(message.topic, TOPIC_NOTIFICATION);
    assert_eq!(message.source, "daemon");
    assert_eq!(message.payload.to_string(), "Task completed successfully");
}

#[tokio::test]
async fn stale_completion_does_not_release_a_new_task() {
    let daemon = daemon();
    let executor = BlockingExecutor::new(false);
    daemon
        .add_plugin(TestPlugin::with_executor("exec", Arc::clone(&executor)))
        .await
        .unwrap();
    daemon.start().await.unwrap();

    // First task gets cancelled by reset; its completion handler is now
    // stale and must not touch the slot once a second task owns it.
    daemon.execute_task(Task::new("chat", "first")).await.unwrap();
    daemon.reset().await.unwrap();

    let second = Task::new("chat", "second");
    let second_id = second.id.clone();
    daemon.execute_task(second).await.unwrap();

    // Let the cancelled task's completion handler run.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(daemon.state().await, DaemonState::Working);
    let status = daemon.status().await;
    assert_eq!(status.current_task.map(|t| t.id), Some(second_id));

    executor.release.notify_one();
    wait_for_idle(&daemon).await;
}

#[tokio::test]
async fn execute_without_executor_fails() {
    let daemon = daemon();
    daemon.add_plugin(TestPlugin::passing("alpha")).await.unwrap();
    daemon.start().await.unwrap();

    let err = daemon
        .execute_task(Task::new("chat", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, DaemonError::NoExecutor));
}

#[tokio::test]
async fn reset_from_idle_fails() {
    let daemon = daemon();
    daemon.start().await.unwrap();
    let err = daemon.reset().await.unwrap_err();
    assert!(matches!(err, DaemonError::NotWorking(DaemonState::Idle)));
}

#[tokio::test]
async fn reset_restores_idle_even_when_cancel_fails() {
    let daemon = daemon();
    let executor = BlockingExecutor::new(true);
    daemon
        .add_plugin(TestPlugin::with_executor("exec", Arc::clone(&executor)))
        .await
        .unwrap();
    daemon.start().await.unwrap();

    daemon.execute_task(Task::new("chat", "hello")).await.unwrap();
    daemon.reset().await.unwrap();

    assert_eq!(daemon.state().await, DaemonState::Idle);
    assert!(executor.cancel_requested.load(Ordering::SeqCst));

    let status = daemon.status().await;
    assert!(status.current_task.is_none());
}

#[tokio::test]
async fn stop_is_idempotent_and_terminal() {
    let daemon = daemon();
    let plugin = TestPlugin::passing("alpha");
    daemon.add_plugin(plugin.clone()).await.unwrap();
    daemon.start().await.unwrap();

    daemon.stop().await;
    assert_eq!(daemon.state().await, DaemonState::Stopped);
    assert!(plugin.stopped.load(Ordering::SeqCst));

    // Second stop is a no-op.
    daemon.stop().await;

    // A stopped daemon never restarts.
    let err = daemon.start().await.unwrap_err();
    assert!(matches!(err, DaemonError::AlreadyStarted));

    let err = daemon
        .execute_task(Task::new("chat", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, DaemonError::NotIdle(DaemonState::Stopped)));
}

#[tokio::test]
async fn stop_closes_the_broker() {
    let daemon = daemon();
    daemon.start().await.unwrap();
    let broker = daemon.broker();

    daemon.stop().await;

    let cancel = CancellationToken::new();
    let message = velo_broker::Message::text("chat", "test", "hi");
    let err = broker.publish(&cancel, message).await.unwrap_err();
    assert_eq!(err, velo_broker::BrokerError::Closed);
}

#[tokio::test]
async fn stop_cancels_an_in_flight_task() {
    let daemon = daemon();
    let executor = BlockingExecutor::new(false);
    daemon
        .add_plugin(TestPlugin::with_executor("exec", Arc::clone(&executor)))
        .await
        .unwrap();
    daemon.start().await.unwrap();

    daemon.execute_task(Task::new("chat", "hello")).await.unwrap();

    // The blocked executor observes the root token through its child and
    // returns, so stop() comes back well inside its deadline.
    daemon.stop().await;
    assert_eq!(daemon.state().await, DaemonState::Stopped);
}
