//! Lock holder identity.
//!
//! A token is written into the cache entry to mark who owns a mutex. It is
//! built from the host name, the process id and a time/random disambiguator so
//! that two concurrent holders never produce the same value.

use crate::error::{MutexError, Result};
use rand::Rng;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lazily generated, overridable lock token.
#[derive(Debug, Clone, Default)]
pub struct LockIdentity {
    token: OnceLock<String>,
}

impl LockIdentity {
    /// Create an identity whose token is generated on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an identity with a caller-chosen token.
    ///
    /// Used to take over ownership established by another component, e.g. a
    /// token printed by an earlier process.
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        let mut identity = Self::new();
        identity.set(token)?;
        Ok(identity)
    }

    /// An identity fixed to the process-wide token, see [`process_identity`].
    pub fn process() -> Self {
        Self {
            token: OnceLock::from(process_identity().to_string()),
        }
    }

    /// The token, generating it on the first call.
    pub fn get(&self) -> &str {
        self.token.get_or_init(generate_token)
    }

    /// Replace the token.
    pub fn set(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(MutexError::InvalidIdentity);
        }
        self.token = OnceLock::from(token);
        Ok(())
    }
}

/// Token shared by everything in this process that asks for it.
///
/// Memoized on first call; stable for the lifetime of the process.
pub fn process_identity() -> &'static str {
    static PROCESS: OnceLock<String> = OnceLock::new();
    PROCESS.get_or_init(generate_token)
}

/// Build a fresh `<host>:<pid>@<time><random>` token.
pub fn generate_token() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "localhost".to_string());

    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or_default();
    let salt: u32 = rand::rng().random();

    format!("{}:{}@{:013x}{:08x}", host, std::process::id(), micros, salt)
}
