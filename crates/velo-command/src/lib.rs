#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Command layer for the velo daemon.
//!
//! Commands are named handlers looked up in an explicit
//! [`CommandRegistry`] and dispatched by the [`Router`], which parses raw
//! input lines (with or without a leading `/`) into a command name and
//! arguments. Each command declares which execution modes it is available
//! in; the router filters accordingly.

mod builtin;
mod command;
mod context;
mod error;
mod registry;
mod router;

pub use builtin::register_builtins;
pub use command::{Command, CommandHandler, CommandOutput, command_fn};
pub use context::CommandContext;
pub use error::{CommandError, CommandResult};
pub use registry::CommandRegistry;
pub use router::Router;

pub use velo_plugin::{DaemonHandle, DaemonState, DaemonStatus};
