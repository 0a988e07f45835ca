//! Configuration types and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which cache backend holds the lock entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backend {
    /// In-process table; only useful inside a single process.
    Memory,
    /// Record files in a shared directory.
    File {
        #[serde(default = "default_lock_dir")]
        dir: PathBuf,
    },
    /// Redis server (requires the `redis` cargo feature).
    Redis { url: String },
}

impl Default for Backend {
    fn default() -> Self {
        Backend::File {
            dir: default_lock_dir(),
        }
    }
}

impl Backend {
    /// Short name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::File { .. } => "file",
            Backend::Redis { .. } => "redis",
        }
    }
}

// Default value functions for serde
pub(crate) fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("cache-mutex")
}
pub(crate) fn default_expiry_secs() -> u64 {
    crate::mutex::DEFAULT_EXPIRY_SECS
}
pub(crate) fn default_max_sleep_ms() -> u64 {
    crate::mutex::DEFAULT_MAX_SLEEP.as_millis() as u64
}
