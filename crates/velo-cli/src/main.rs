//! `velo` — a modular daemon service with a plugin architecture.
//!
//! Thin entry point: parse flags, load configuration, set up logging, build
//! the registries, run the daemon until interrupted.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use velo_command::{CommandRegistry, register_builtins};
use velo_config::Mode;
use velo_daemon::Daemon;
use velo_plugin::{Plugin, PluginRegistry};
use velo_telemetry::{LogConfig, LogFormat, setup_logging};

/// Velo daemon — modular background service with a plugin architecture.
#[derive(Parser)]
#[command(name = "velo")]
#[command(
    author,
    version,
    about = "A modular daemon service with a plugin architecture"
)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, default_value = "velo.toml")]
    config: PathBuf,

    /// Override the configured execution mode (daemon or interactive).
    #[arg(long)]
    mode: Option<Mode>,

    /// List registered plugins and exit.
    #[arg(long)]
    list_plugins: bool,
}

/// The bootstrap list: every plugin shipped with this binary.
///
/// Plugins are constructed and registered explicitly here — there is no
/// import-time side registration. A plugin that registers commands takes
/// the command registry as a constructor argument.
fn bootstrap_plugins(_commands: &Arc<CommandRegistry>) -> Vec<Arc<dyn Plugin>> {
    Vec::new()
}

fn build_plugin_registry(commands: &Arc<CommandRegistry>) -> Result<Arc<PluginRegistry>> {
    let registry = Arc::new(PluginRegistry::new());
    for plugin in bootstrap_plugins(commands) {
        let name = plugin.name().to_owned();
        registry
            .register(plugin)
            .with_context(|| format!("registering plugin {name}"))?;
    }
    Ok(registry)
}

fn print_plugins(registry: &PluginRegistry) {
    let plugins = registry.all();
    println!("Registered plugins ({}):\n", plugins.len());
    for (i, plugin) in plugins.iter().enumerate() {
        println!("{}. {}", i.saturating_add(1), plugin.name());
        let extensions = plugin.extensions();
        if !extensions.is_empty() {
            println!("   Extensions:");
            for ext in extensions {
                println!("     - {}:{}", ext.kind(), ext.name());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = velo_config::load_or_default(Some(args.config.as_path()))
        .context("failed to load configuration")?;
    if let Some(mode) = args.mode {
        config.mode = mode;
        config
            .validate()
            .context("invalid configuration after mode override")?;
    }
    let config = Arc::new(config);

    let log_config = LogConfig::new(&config.daemon.log_level).with_format(LogFormat::Compact);
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let commands = Arc::new(CommandRegistry::new());
    let plugins = build_plugin_registry(&commands)?;

    if args.list_plugins {
        print_plugins(&plugins);
        return Ok(());
    }

    register_builtins(&commands, Arc::clone(&plugins))
        .context("registering built-in commands")?;

    let daemon = Daemon::new(Arc::clone(&config));
    for plugin in plugins.all() {
        let name = plugin.name().to_owned();
        if let Err(e) = daemon.add_plugin(plugin).await {
            warn!(plugin = %name, error = %e, "Failed to add plugin");
        }
    }

    daemon.start().await.context("failed to start daemon")?;
    info!(mode = %config.mode, "Daemon running; press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutdown signal received; stopping");
    daemon.stop().await;
    Ok(())
}
