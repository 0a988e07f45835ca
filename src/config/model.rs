//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for the cache-mutex CLI.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Seconds a lock lives before the backend discards it (0 = never).
    #[serde(default = "default_expiry_secs")]
    pub default_expiry_secs: u64,

    /// How long to wait for a busy lock, in milliseconds.
    /// 0 tries once; a negative value waits forever.
    #[serde(default)]
    pub wait_timeout_ms: i64,

    /// Upper bound on one pause between acquisition attempts.
    #[serde(default = "default_max_sleep_ms")]
    pub max_sleep_ms: u64,

    // =========================================================================
    // Backend settings
    // =========================================================================
    /// Where lock entries are stored.
    #[serde(default)]
    pub backend: Backend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_expiry_secs: default_expiry_secs(),
            wait_timeout_ms: 0,
            max_sleep_ms: default_max_sleep_ms(),
            backend: Backend::default(),
        }
    }
}
