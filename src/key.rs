//! Mutex key validation.
//!
//! Resource names become storage keys by prefixing [`MUTEX_PREFIX`]. Names are
//! checked once, when a handle is built, so every key that reaches a provider
//! fits the backend's key ceiling and contains no whitespace.

use crate::error::{MutexError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Namespace tag placed in front of every resource name.
pub const MUTEX_PREFIX: &str = "MUTEX:";

/// Longest accepted resource name, in characters.
///
/// Counted in characters, not bytes: a name of multi-byte characters can
/// exceed 250 bytes once prefixed. Backends with a byte ceiling on keys
/// (Memcached's is 250) need names kept to ASCII or shorter.
pub const MAX_NAME_LEN: usize = 200;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n]").expect("whitespace pattern is valid"));

/// A validated, namespaced storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutexKey {
    key: String,
}

impl MutexKey {
    /// Validate `name` and build its key.
    ///
    /// Numeric and string zero are valid names. Empty names, names longer than
    /// [`MAX_NAME_LEN`] characters and names containing a space, tab, newline
    /// or carriage return are rejected with [`MutexError::InvalidKey`].
    pub fn new(name: impl fmt::Display) -> Result<Self> {
        let name = name.to_string();

        if name.is_empty() {
            return Err(MutexError::invalid_key(&name, "name must not be empty"));
        }

        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(MutexError::invalid_key(
                &name,
                format!(
                    "name is {} characters, at most {} are allowed",
                    len, MAX_NAME_LEN
                ),
            ));
        }

        if WHITESPACE.is_match(&name) {
            return Err(MutexError::invalid_key(
                &name,
                "name must not contain whitespace",
            ));
        }

        Ok(Self {
            key: format!("{}{}", MUTEX_PREFIX, name),
        })
    }

    /// The full storage key, prefix included.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The resource name without the namespace prefix.
    pub fn name(&self) -> &str {
        &self.key[MUTEX_PREFIX.len()..]
    }
}

impl fmt::Display for MutexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for MutexKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}
