//! Built-in commands: help, status, reset, plugins.

use std::fmt::Write as _;
use std::sync::Arc;

use velo_plugin::{DaemonState, DaemonStatus, PluginRegistry};

use crate::command::{Command, CommandOutput, command_fn};
use crate::error::{CommandError, CommandResult};
use crate::registry::CommandRegistry;
use crate::router::Router;

/// Register the built-in commands on `commands`.
///
/// `help` renders against the same registry it is registered on; `plugins`
/// lists the contents of `plugins`.
///
/// # Errors
///
/// Returns [`CommandError::AlreadyRegistered`] if any builtin name is
/// already taken.
pub fn register_builtins(
    commands: &Arc<CommandRegistry>,
    plugins: Arc<PluginRegistry>,
) -> CommandResult<()> {
    let help_registry = Arc::clone(commands);
    commands.register(Command::new(
        "help",
        "Show available commands or help for a specific command",
        "[command]",
        command_fn(move |ctx, args| {
            let router = Router::new(Arc::clone(&help_registry));
            async move {
                if let Some(arg) = args.first() {
                    let name = arg.strip_prefix('/').unwrap_or(arg);
                    let text = router.get_command_help(name)?;
                    return Ok(CommandOutput::text(text));
                }
                Ok(CommandOutput::text(router.get_help(ctx.mode)))
            }
        }),
    ))?;

    commands.register(Command::new(
        "status",
        "Show daemon status and active plugins",
        "",
        command_fn(|ctx, _args| async move {
            let status = ctx.daemon.status().await;
            Ok(CommandOutput::text(render_status(&status)))
        }),
    ))?;

    commands.register(Command::new(
        "reset",
        "Stop current task and reset to idle state",
        "",
        command_fn(|ctx, _args| async move {
            ctx.daemon
                .reset()
                .await
                .map_err(|e| CommandError::Daemon(format!("reset failed: {e}")))?;
            Ok(CommandOutput::broadcast("Daemon reset to idle state"))
        }),
    ))?;

    commands.register(Command::new(
        "plugins",
        "List all registered plugins",
        "",
        command_fn(move |_ctx, _args| {
            let plugins = Arc::clone(&plugins);
            async move { Ok(CommandOutput::text(render_plugins(&plugins))) }
        }),
    ))?;

    Ok(())
}

fn render_status(status: &DaemonStatus) -> String {
    let mut out = String::from("Daemon Status:\n");
    let _ = writeln!(out, "  State: {}", status.state);
    let _ = writeln!(out, "  Mode: {}", status.mode);
    let _ = writeln!(out, "  Active Plugins: {}", status.active_plugins.len());

    if status.state == DaemonState::Working {
        if let Some(task) = &status.current_task {
            let _ = writeln!(out, "  Current Task: {} (ID: {})", task.kind, task.id);
        }
        if let Some(exec) = &status.executor {
            let _ = writeln!(out, "  Progress: {}%", exec.progress);
            if !exec.message.is_empty() {
                let _ = writeln!(out, "  Message: {}", exec.message);
            }
        }
    }
    out
}

fn render_plugins(registry: &PluginRegistry) -> String {
    let plugins = registry.all();
    if plugins.is_empty() {
        return "No plugins registered".to_owned();
    }

    let mut out = format!("Registered plugins ({}):\n\n", plugins.len());
    for (i, plugin) in plugins.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i.saturating_add(1), plugin.name());
        let extensions = plugin.extensions();
        if !extensions.is_empty() {
            let names: Vec<_> = extensions
                .iter()
                .map(|ext| format!("{}:{}", ext.kind(), ext.name()))
                .collect();
            let _ = writeln!(out, "   Extensions: {}", names.join(", "));
        }
    }
    out
}
