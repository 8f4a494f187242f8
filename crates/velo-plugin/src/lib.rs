#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Plugin contract for the velo daemon.
//!
//! A [`Plugin`] is a named, independently startable unit that advertises
//! typed capabilities ([`Extension`]s): commands, a task [`Executor`], a
//! [`StateManager`], or an interaction channel. Before a plugin is started
//! it must pass its declared [`RequirementChecker`] preconditions.
//!
//! Registries are explicit objects built once at bootstrap and passed by
//! reference — there are no global catalogs and no import-time side
//! effects. Cross-cutting values (mode, config, shutdown signal) travel in
//! the typed [`StartupContext`] rather than an untyped context bag.

mod context;
mod error;
mod extension;
mod handle;
mod plugin;
mod registry;
mod requirements;
mod task;

pub use context::StartupContext;
pub use error::{PluginError, PluginResult};
pub use extension::{Executor, Extension, ExtensionKind, StateManager};
pub use handle::{DaemonHandle, DaemonState, DaemonStatus};
pub use plugin::Plugin;
pub use registry::PluginRegistry;
pub use requirements::{
    CheckFn, Requirement, RequirementChecker, require_all, require_any, require_mode,
    require_setting,
};
pub use task::{ExecutorState, ExecutorStatus, Task};
