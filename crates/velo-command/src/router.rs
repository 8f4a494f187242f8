//! Command parsing and dispatch.

use std::sync::Arc;

use tracing::debug;

use crate::command::CommandOutput;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};
use crate::registry::CommandRegistry;

/// Parses raw input lines and dispatches them against a
/// [`CommandRegistry`].
///
/// Accepted formats: `"/command arg1 arg2"` and `"command arg1 arg2"`.
#[derive(Clone)]
pub struct Router {
    registry: Arc<CommandRegistry>,
}

impl Router {
    /// Create a router over the given registry.
    #[must_use]
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Parse `input` and run the matching command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Empty`] for blank input,
    /// [`CommandError::Unknown`] for an unregistered name,
    /// [`CommandError::NotAvailable`] when the command exists but not in
    /// the context's mode, and whatever the handler itself returns.
    pub async fn route(&self, ctx: &CommandContext, input: &str) -> CommandResult<CommandOutput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CommandError::Empty);
        }

        let Some((name, args)) = parse(input) else {
            return Err(CommandError::Invalid);
        };

        let Some(command) = self.registry.get(&name) else {
            return Err(CommandError::Unknown(name));
        };
        if !command.supports_mode(ctx.mode) {
            return Err(CommandError::NotAvailable {
                name,
                mode: ctx.mode,
            });
        }

        debug!(command = %command.name, args = args.len(), "routing command");
        command.handler.handle(ctx, &args).await
    }

    /// Whether `input` looks like a command (leading `/` after trimming).
    #[must_use]
    pub fn is_command(input: &str) -> bool {
        input.trim_start().starts_with('/')
    }

    /// Help text listing every command visible in `mode`.
    #[must_use]
    pub fn get_help(&self, mode: velo_config::Mode) -> String {
        let commands = self.registry.visible(mode);
        if commands.is_empty() {
            return "No commands available.".to_owned();
        }

        let mut out = String::from("Available commands:\n\n");
        for cmd in commands {
            out.push('/');
            out.push_str(&cmd.name);
            if !cmd.usage.is_empty() {
                out.push(' ');
                out.push_str(&cmd.usage);
            }
            out.push('\n');
            if !cmd.description.is_empty() {
                out.push_str("  ");
                out.push_str(&cmd.description);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Help text for one command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unknown`] if no such command is registered.
    pub fn get_command_help(&self, name: &str) -> CommandResult<String> {
        let Some(cmd) = self.registry.get(name) else {
            return Err(CommandError::Unknown(name.to_owned()));
        };

        let mut out = format!("Command: /{}\n\n", cmd.name);
        if !cmd.description.is_empty() {
            out.push_str(&cmd.description);
            out.push_str("\n\n");
        }
        if !cmd.usage.is_empty() {
            out.push_str(&format!("Usage: /{} {}\n", cmd.name, cmd.usage));
        }
        if !cmd.modes.is_empty() {
            let modes: Vec<_> = cmd.modes.iter().map(ToString::to_string).collect();
            out.push_str(&format!("\nAvailable in modes: {}", modes.join(", ")));
        }
        Ok(out)
    }
}

/// Split an input line into command name and arguments.
///
/// Strips one leading `/` and splits on whitespace. Returns `None` when no
/// tokens remain (e.g. the input was just `"/"`).
fn parse(input: &str) -> Option<(String, Vec<String>)> {
    let input = input.strip_prefix('/').unwrap_or(input);
    let mut tokens = input.split_whitespace();
    let name = tokens.next()?.to_owned();
    let args = tokens.map(ToOwned::to_owned).collect();
    Some((name, args))
}
