#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the velo daemon.
//!
//! This crate provides the [`Config`] type consumed by every other velo
//! crate: daemon tuning knobs, the per-plugin enable/settings table, and the
//! execution [`Mode`]. Configuration is loaded from a TOML file with
//! defaults applied for any missing field.
//!
//! This crate has **no dependencies on other velo crates** — it sits at the
//! bottom of the workspace dependency graph.
//!
//! # Example
//!
//! ```rust
//! use velo_config::{Config, Mode};
//!
//! let config = Config::default();
//! assert_eq!(config.mode, Mode::Daemon);
//! assert_eq!(config.daemon.broker_buffer_size, 100);
//! assert!(config.is_plugin_enabled("anything"));
//! ```

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_or_default, save};
pub use types::{Config, DaemonConfig, Mode, PluginConfig};
