//! The plugin contract.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use velo_broker::Broker;

use crate::context::StartupContext;
use crate::error::PluginResult;
use crate::extension::Extension;

/// A named, independently startable unit of functionality.
///
/// The lifecycle is: [`check_requirements`](Plugin::check_requirements) →
/// [`start`](Plugin::start) → (running) → [`stop`](Plugin::stop). A plugin
/// whose requirement check fails is skipped, not fatal; the daemon starts
/// with whatever subset passed.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The plugin's unique name.
    fn name(&self) -> &str;

    /// Verify every precondition this plugin needs.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::RequirementsFailed`](crate::PluginError::RequirementsFailed)
    /// listing every failed required check.
    fn check_requirements(&self, ctx: &StartupContext) -> PluginResult<()>;

    /// The capabilities this plugin advertises once started.
    fn extensions(&self) -> Vec<Arc<dyn Extension>>;

    /// Start the plugin.
    ///
    /// The plugin may subscribe to the broker (with
    /// [`ctx.subscription_capacity()`](StartupContext::subscription_capacity)
    /// unless it needs its own) and spawn background work observing
    /// `ctx.shutdown`.
    ///
    /// # Errors
    ///
    /// Returns an error if startup fails; the daemon drops the plugin and
    /// continues with the rest.
    async fn start(&self, ctx: &StartupContext, broker: Arc<Broker>) -> PluginResult<()>;

    /// Stop the plugin and release its resources.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails; shutdown continues regardless.
    async fn stop(&self) -> PluginResult<()>;
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name()).finish()
    }
}
