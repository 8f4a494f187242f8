#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Logging setup for the velo daemon.
//!
//! One call to [`setup_logging`] installs a `tracing-subscriber` registry
//! for the whole process. The filter honours the `VELO_LOG` environment
//! variable over the configured level, so operators can raise verbosity
//! without touching the config file.

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, setup_default_logging, setup_logging};
