//! Configuration file loading and saving.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Load configuration from a TOML file and validate it.
///
/// Missing fields take their documented defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, is not valid TOML,
/// or fails validation.
pub fn load(path: &Path) -> ConfigResult<Config> {
    let raw = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate()?;
    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Load configuration from a file, or return defaults when it is absent.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file exists but cannot be loaded.
pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Config> {
    match path {
        Some(p) if p.exists() => load(p),
        _ => {
            debug!("No config file; using defaults");
            Ok(Config::default())
        },
    }
}

/// Write the configuration to a TOML file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if serialization or the write fails.
pub fn save(config: &Config, path: &Path) -> ConfigResult<()> {
    let raw = toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    fs::write(path, raw)?;
    debug!(path = %path.display(), "Saved configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn load_or_default_returns_defaults_for_missing_path() {
        let config = load_or_default(Some(Path::new("/nonexistent/velo.toml"))).unwrap();
        assert_eq!(config, Config::default());

        let config = load_or_default(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_parses_a_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velo.toml");
        fs::write(
            &path,
            r#"
            mode = "interactive"

            [daemon]
            log_level = "debug"
            broker_buffer_size = 32
            publish_timeout_secs = 2

            [plugins.telegram]
            enabled = false
            "#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.mode, Mode::Interactive);
        assert_eq!(config.daemon.log_level, "debug");
        assert_eq!(config.daemon.broker_buffer_size, 32);
        assert_eq!(config.daemon.publish_timeout_secs, 2);
        assert!(!config.is_plugin_enabled("telegram"));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velo.toml");
        fs::write(&path, "mode = [not toml").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velo.toml");
        fs::write(&path, "[daemon]\nlog_level = \"loud\"\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(s) if s == "loud"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velo.toml");

        let mut config = Config::default();
        config.mode = Mode::Interactive;
        config.daemon.broker_buffer_size = 7;
        save(&config, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
