//! Explicit command catalog.

use std::collections::HashMap;
use std::sync::RwLock;

use velo_config::Mode;

use crate::command::Command;
use crate::error::{CommandError, CommandResult};

/// A catalog of commands, keyed by name.
///
/// Built at bootstrap; duplicate registration is an error the caller
/// treats as fatal.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Command>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::AlreadyRegistered`] if the name is taken.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn register(&self, command: Command) -> CommandResult<()> {
        #[allow(clippy::unwrap_used)]
        let mut commands = self.commands.write().unwrap();
        if commands.contains_key(&command.name) {
            return Err(CommandError::AlreadyRegistered(command.name));
        }
        commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// Look up a command by name.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Command> {
        #[allow(clippy::unwrap_used)]
        let commands = self.commands.read().unwrap();
        commands.get(name).cloned()
    }

    /// Every command available in `mode`, hidden ones excluded, sorted by
    /// name.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn visible(&self, mode: Mode) -> Vec<Command> {
        #[allow(clippy::unwrap_used)]
        let commands = self.commands.read().unwrap();
        let mut visible: Vec<_> = commands
            .values()
            .filter(|c| !c.hidden && c.supports_mode(mode))
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.name.cmp(&b.name));
        visible
    }

    /// Number of registered commands.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[allow(clippy::unwrap_used)]
        let commands = self.commands.read().unwrap();
        commands.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, command_fn};

    fn cmd(name: &str) -> Command {
        Command::new(
            name,
            "test",
            format!("/{name}"),
            command_fn(|_ctx, _args| async { Ok(CommandOutput::text("ok")) }),
        )
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = CommandRegistry::new();
        registry.register(cmd("status")).unwrap();
        let err = registry.register(cmd("status")).unwrap_err();
        assert!(matches!(err, CommandError::AlreadyRegistered(name) if name == "status"));
    }

    #[test]
    fn visible_filters_hidden_and_mode() {
        let registry = CommandRegistry::new();
        registry.register(cmd("status")).unwrap();
        registry.register(cmd("debug").hide()).unwrap();
        registry
            .register(cmd("chat").with_modes(vec![Mode::Interactive]))
            .unwrap();

        let daemon_visible = registry.visible(Mode::Daemon);
        assert_eq!(daemon_visible.len(), 1);
        assert_eq!(daemon_visible[0].name, "status");

        let interactive_visible = registry.visible(Mode::Interactive);
        let names: Vec<_> = interactive_visible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["chat", "status"]);
    }

    #[test]
    fn hidden_commands_still_resolve() {
        let registry = CommandRegistry::new();
        registry.register(cmd("debug").hide()).unwrap();
        assert!(registry.get("debug").is_some());
    }
}
