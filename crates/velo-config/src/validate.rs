//! Configuration validation rules.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Check that the configuration is internally valid.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first rule violated.
    pub fn validate(&self) -> ConfigResult<()> {
        if !VALID_LOG_LEVELS.contains(&self.daemon.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.daemon.log_level.clone()));
        }
        if self.daemon.broker_buffer_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "daemon.broker_buffer_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.daemon.publish_timeout_secs < 1 {
            return Err(ConfigError::InvalidValue {
                field: "daemon.publish_timeout_secs",
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.daemon.log_level = "verbose".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidLogLevel(_)
        ));
    }

    #[test]
    fn rejects_zero_buffer_size() {
        let mut config = Config::default();
        config.daemon.broker_buffer_size = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidValue {
                field: "daemon.broker_buffer_size",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_publish_timeout() {
        let mut config = Config::default();
        config.daemon.publish_timeout_secs = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidValue {
                field: "daemon.publish_timeout_secs",
                ..
            }
        ));
    }
}
