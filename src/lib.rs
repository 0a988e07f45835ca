//! cache-mutex: named mutual exclusion over a shared cache.
//!
//! Processes on one or many machines coordinate exclusive access to a named
//! resource by racing to store a unique token under a key derived from the
//! resource name. The only primitives required from the store are atomic
//! add-if-absent, get, set-with-expiry and delete, captured by
//! [`MutexProvider`]. Entry expiry is the only crash recovery: a holder that
//! dies leaves its entry until the backend discards it.
//!
//! ```
//! use cache_mutex::{MemoryProvider, Mutex, MutexError};
//!
//! let provider = MemoryProvider::new();
//! let first = Mutex::new(&provider, "TestMutex")?;
//! let second = Mutex::new(&provider, "TestMutex")?;
//!
//! first.lock(15)?;
//! assert!(second.lock(15).unwrap_err().is_lock_failed());
//!
//! first.unlock()?;
//! second.lock(15)?;
//! # Ok::<(), MutexError>(())
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub(crate) mod fs;
pub mod identity;
pub mod key;
pub mod logging;
pub mod mutex;
pub mod provider;

#[cfg(test)]
mod test_support;

pub use error::{MutexError, ProviderError, Result};
pub use identity::LockIdentity;
pub use key::{MUTEX_PREFIX, MutexKey};
pub use mutex::{DEFAULT_EXPIRY_SECS, DEFAULT_MAX_SLEEP, Mutex, WaitTimeout, with_lock};
pub use provider::{FileProvider, MemoryProvider, MemoryStore, MutexProvider};
#[cfg(feature = "redis")]
pub use provider::RedisProvider;
