//! Error types for cache-mutex.
//!
//! Two layers are kept apart: [`ProviderError`] is whatever the backing store
//! reports (I/O, corrupt records, network) and is passed through untouched,
//! while [`MutexError`] carries the protocol outcomes callers branch on.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by a cache provider backend.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Filesystem operation on a lock entry failed.
    #[error("lock entry I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored lock entry could not be decoded.
    #[error("lock entry '{path}' is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The remote cache backend rejected or failed a command.
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl ProviderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProviderError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Main error type for mutex operations.
#[derive(Error, Debug)]
pub enum MutexError {
    /// The resource name cannot be turned into a storage key.
    #[error("invalid mutex name '{name}': {reason}")]
    InvalidKey { name: String, reason: String },

    /// An identity override was empty.
    #[error("lock identity must not be empty")]
    InvalidIdentity,

    /// The entry is held by another token.
    #[error("Failed to lock")]
    LockFailed,

    /// The provider failed underneath the protocol.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Configuration could not be read or is invalid.
    #[error("{0}")]
    Config(String),

    /// A CLI command could not be started or was malformed.
    #[error("{0}")]
    Command(String),

    /// A command run under the lock exited unsuccessfully.
    #[error("command exited with status {code}")]
    CommandFailed { code: i32 },
}

impl MutexError {
    pub(crate) fn invalid_key(name: &str, reason: impl Into<String>) -> Self {
        MutexError::InvalidKey {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error signals contention rather than a fault.
    pub fn is_lock_failed(&self) -> bool {
        matches!(self, MutexError::LockFailed)
    }

    /// Returns the process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            MutexError::InvalidKey { .. } => exit_codes::INVALID_KEY,
            MutexError::InvalidIdentity => exit_codes::USER_ERROR,
            MutexError::LockFailed => exit_codes::LOCK_FAILURE,
            MutexError::Provider(_) => exit_codes::PROVIDER_FAILURE,
            MutexError::Config(_) => exit_codes::USER_ERROR,
            MutexError::Command(_) => exit_codes::USER_ERROR,
            MutexError::CommandFailed { .. } => exit_codes::COMMAND_FAILURE,
        }
    }
}

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type alias for mutex operations.
pub type Result<T> = std::result::Result<T, MutexError>;
