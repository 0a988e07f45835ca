//! Cache provider capability.
//!
//! The mutex protocol only needs four primitives from the backing store. Any
//! backend that can offer them, with `try_claim` atomic against other
//! claimants, can coordinate mutexes:
//!
//! - `try_claim`: store a token only if no live entry exists
//! - `read`: the current holder token, if any
//! - `renew`: unconditionally rewrite the token with a fresh expiry
//! - `remove`: delete the entry
//!
//! Expiry is given in whole seconds; `0` means the entry never expires.
//! Expiries above [`MAX_EXPIRY_SECS`] are stored as never expiring too, as is
//! any expiry whose deadline a backend cannot represent.
//!
//! # Backends
//!
//! - [`MemoryProvider`]: in-process map over an injectable [`MemoryStore`]
//! - [`FileProvider`]: one record file per key, claimed with exclusive create
//! - `RedisProvider`: networked cache (cargo feature `redis`)

mod file;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use file::{FileProvider, LockRecord};
pub use memory::{MemoryProvider, MemoryStore};
#[cfg(feature = "redis")]
pub use self::redis::RedisProvider;

use crate::error::ProviderResult;
use crate::key::MutexKey;
use std::sync::Arc;
use std::time::Duration;

/// The locking capability a cache backend must offer.
pub trait MutexProvider {
    /// Atomically store `token` under `key` if no live entry exists.
    ///
    /// Returns whether the store happened.
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool>;

    /// The token currently stored under `key`, or `None` if unset or expired.
    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>>;

    /// Write `token` under `key` with a fresh expiry, whatever is stored now.
    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()>;

    /// Delete the entry under `key` if present.
    fn remove(&self, key: &MutexKey) -> ProviderResult<()>;
}

/// Longest expiry honoured as a deadline, one hundred years in seconds.
pub const MAX_EXPIRY_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Time to live for an expiry in seconds; `None` when it never expires.
pub fn ttl(expiry_secs: u64) -> Option<Duration> {
    (1..=MAX_EXPIRY_SECS)
        .contains(&expiry_secs)
        .then(|| Duration::from_secs(expiry_secs))
}

impl<P: MutexProvider + ?Sized> MutexProvider for &P {
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool> {
        (**self).try_claim(key, token, expiry_secs)
    }

    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>> {
        (**self).read(key)
    }

    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()> {
        (**self).renew(key, token, expiry_secs)
    }

    fn remove(&self, key: &MutexKey) -> ProviderResult<()> {
        (**self).remove(key)
    }
}

impl<P: MutexProvider + ?Sized> MutexProvider for Arc<P> {
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool> {
        (**self).try_claim(key, token, expiry_secs)
    }

    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>> {
        (**self).read(key)
    }

    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()> {
        (**self).renew(key, token, expiry_secs)
    }

    fn remove(&self, key: &MutexKey) -> ProviderResult<()> {
        (**self).remove(key)
    }
}

impl<P: MutexProvider + ?Sized> MutexProvider for Box<P> {
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool> {
        (**self).try_claim(key, token, expiry_secs)
    }

    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>> {
        (**self).read(key)
    }

    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()> {
        (**self).renew(key, token, expiry_secs)
    }

    fn remove(&self, key: &MutexKey) -> ProviderResult<()> {
        (**self).remove(key)
    }
}
