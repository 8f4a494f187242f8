//! Configuration struct definitions.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The daemon's execution mode.
///
/// The mode gates which plugins pass their requirement checks and which
/// commands are dispatchable. It is carried in the typed startup and
/// command contexts rather than in an untyped ambient bag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Background daemon mode.
    #[default]
    Daemon,
    /// Interactive mode with direct user input.
    Interactive,
}

impl Mode {
    /// The lowercase string form used in config files and help text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daemon => "daemon",
            Self::Interactive => "interactive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daemon" => Ok(Self::Daemon),
            "interactive" => Ok(Self::Interactive),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// Top-level velo configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Daemon tuning knobs.
    pub daemon: DaemonConfig,
    /// Per-plugin configuration, keyed by plugin name.
    pub plugins: HashMap<String, PluginConfig>,
    /// The execution mode.
    pub mode: Mode,
}

impl Config {
    /// Whether a plugin is administratively enabled.
    ///
    /// Plugins absent from the `plugins` table are enabled; a listed plugin
    /// can be switched off with `enabled = false`.
    #[must_use]
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        self.plugins.get(name).is_none_or(|p| p.enabled)
    }

    /// Look up a raw setting for a plugin.
    #[must_use]
    pub fn plugin_setting(&self, plugin: &str, key: &str) -> Option<&serde_json::Value> {
        self.plugins.get(plugin)?.settings.get(key)
    }

    /// Look up a string setting for a plugin.
    #[must_use]
    pub fn plugin_setting_str(&self, plugin: &str, key: &str) -> Option<&str> {
        self.plugin_setting(plugin, key)?.as_str()
    }

    /// Look up an integer setting for a plugin.
    #[must_use]
    pub fn plugin_setting_i64(&self, plugin: &str, key: &str) -> Option<i64> {
        self.plugin_setting(plugin, key)?.as_i64()
    }

    /// Look up a boolean setting for a plugin.
    #[must_use]
    pub fn plugin_setting_bool(&self, plugin: &str, key: &str) -> Option<bool> {
        self.plugin_setting(plugin, key)?.as_bool()
    }
}

/// Daemon-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Logging level (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: String,
    /// Default buffer capacity for broker subscriptions, surfaced to
    /// plugins as `StartupContext::subscription_capacity`.
    pub broker_buffer_size: usize,
    /// Timeout for publishing to a slow consumer, in seconds.
    pub publish_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            broker_buffer_size: 100,
            publish_timeout_secs: 5,
        }
    }
}

/// Configuration for a single plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Whether the plugin should be loaded.
    pub enabled: bool,
    /// Plugin-specific settings.
    pub settings: HashMap<String, serde_json::Value>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settings: HashMap::new(),
        }
    }
}
