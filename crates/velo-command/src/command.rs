//! Command definition and handler trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use velo_config::Mode;

use crate::context::CommandContext;
use crate::error::CommandResult;

/// What a command produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// Text to show the caller.
    pub output: String,
    /// Optional structured payload.
    pub data: Option<serde_json::Value>,
    /// Whether the output should be published to every channel rather than
    /// only the caller.
    pub broadcast: bool,
}

impl CommandOutput {
    /// Plain text output for the caller only.
    #[must_use]
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            data: None,
            broadcast: false,
        }
    }

    /// Text output published to every channel.
    #[must_use]
    pub fn broadcast(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            data: None,
            broadcast: true,
        }
    }

    /// Attach a structured payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Executes one command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; the router converts it into
    /// a display-ready message.
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> CommandResult<CommandOutput>;
}

/// A registered command: metadata plus its handler.
#[derive(Clone)]
pub struct Command {
    /// Command name, without the leading `/`.
    pub name: String,
    /// One-line description for help output.
    pub description: String,
    /// Usage string, e.g. `"/reset"`.
    pub usage: String,
    /// Modes this command is available in. Empty means every mode.
    pub modes: Vec<Mode>,
    /// Hidden commands run normally but are omitted from help.
    pub hidden: bool,
    /// The handler.
    pub handler: Arc<dyn CommandHandler>,
}

impl Command {
    /// Create a command available in every mode.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        usage: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: usage.into(),
            modes: Vec::new(),
            hidden: false,
            handler,
        }
    }

    /// Restrict the command to the given modes.
    #[must_use]
    pub fn with_modes(mut self, modes: Vec<Mode>) -> Self {
        self.modes = modes;
        self
    }

    /// Hide the command from help output.
    #[must_use]
    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Whether the command is available in `mode`.
    #[must_use]
    pub fn supports_mode(&self, mode: Mode) -> bool {
        self.modes.is_empty() || self.modes.contains(&mode)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("modes", &self.modes)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = CommandResult<CommandOutput>> + Send>>;

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext, Vec<String>) -> HandlerFuture + Send + Sync,
{
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> CommandResult<CommandOutput> {
        (self.f)(ctx.clone(), args.to_vec()).await
    }
}

/// Wrap an async closure as a [`CommandHandler`].
pub fn command_fn<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(CommandContext, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult<CommandOutput>> + Send + 'static,
{
    Arc::new(FnHandler {
        f: move |ctx, args| Box::pin(f(ctx, args)) as HandlerFuture,
    })
}
