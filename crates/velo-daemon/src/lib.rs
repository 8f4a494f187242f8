#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! The velo daemon: a lifecycle state machine over a broker and a set of
//! plugins.
//!
//! The daemon admits plugins before startup (configuration-gated), starts
//! those whose requirements pass, runs at most one task at a time through
//! the single installed executor, and shuts everything down within a
//! bounded deadline.

mod daemon;
mod error;

pub use daemon::{DEFAULT_SHUTDOWN_TIMEOUT, Daemon};
pub use error::{DaemonError, DaemonResult};
