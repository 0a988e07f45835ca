//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::Backend;
use crate::error::{MutexError, Result};
use crate::mutex::WaitTimeout;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a config file when none is given explicitly.
pub const CONFIG_ENV: &str = "CACHE_MUTEX_CONFIG";

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            MutexError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Resolve the active config.
    ///
    /// Uses `explicit` if given, otherwise the file named by [`CONFIG_ENV`],
    /// otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| MutexError::Config(format!("failed to parse config YAML: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| MutexError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `max_sleep_ms` must be positive
    /// - a file backend needs a non-empty directory
    /// - a redis backend needs a non-empty URL
    pub fn validate(&self) -> Result<()> {
        if self.max_sleep_ms == 0 {
            return Err(MutexError::Config(
                "config validation failed: max_sleep_ms must be greater than 0".to_string(),
            ));
        }

        match &self.backend {
            Backend::File { dir } if dir.as_os_str().is_empty() => Err(MutexError::Config(
                "config validation failed: file backend requires a non-empty dir".to_string(),
            )),
            Backend::Redis { url } if url.trim().is_empty() => Err(MutexError::Config(
                "config validation failed: redis backend requires a url".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// The retry pause ceiling as a duration.
    pub fn max_sleep(&self) -> Duration {
        Duration::from_millis(self.max_sleep_ms)
    }

    /// The configured wait as a [`WaitTimeout`].
    pub fn wait_timeout(&self) -> WaitTimeout {
        WaitTimeout::from_millis(self.wait_timeout_ms)
    }
}
