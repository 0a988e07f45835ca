//! Named distributed mutex.
//!
//! A [`Mutex`] binds a provider, a validated key and a holder identity. It
//! keeps no belief of its own about being locked: every ownership question is
//! answered by reading the provider, so expiry or outside interference shows
//! up immediately.
//!
//! # Operations
//!
//! - [`Mutex::lock`]: claim the entry, succeeding again if we already own it
//! - [`Mutex::try_lock`]: `lock` that reports contention as `false`
//! - [`Mutex::wait_lock`]: poll `lock` until it succeeds or the timeout passes
//! - [`Mutex::unlock`]: remove the entry if we own it
//! - [`Mutex::touch`]: renew the expiry if we own it (not atomic)
//! - [`with_lock`]: acquire, run a closure, release on every exit path
//!
//! # Release on drop
//!
//! Dropping a handle attempts an unlock as a safety net for forgotten
//! releases. Failures are logged, never raised. Handles that must outlive
//! their owner (e.g. a lock taken by one CLI invocation and released by a
//! later one) turn this off with [`Mutex::set_release_on_drop`].

mod scoped;
mod wait;


pub use scoped::with_lock;
pub use wait::WaitTimeout;

use crate::error::{MutexError, Result};
use crate::identity::LockIdentity;
use crate::key::MutexKey;
use crate::provider::MutexProvider;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Seconds a lock is held before the backend discards it.
pub const DEFAULT_EXPIRY_SECS: u64 = 15;

/// Ceiling on a single pause between `wait_lock` attempts.
pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_millis(5000);

/// Handle on a named mutex stored in a cache provider.
pub struct Mutex<P: MutexProvider> {
    provider: P,
    key: MutexKey,
    identity: LockIdentity,
    release_on_drop: bool,
}

impl<P: MutexProvider> Mutex<P> {
    /// Bind `name` on `provider` with a freshly generated identity.
    ///
    /// Fails with [`MutexError::InvalidKey`] if the name is not usable.
    pub fn new(provider: P, name: impl fmt::Display) -> Result<Self> {
        Self::with_identity(provider, name, LockIdentity::new())
    }

    /// Alias of [`Mutex::new`].
    pub fn create(provider: P, name: impl fmt::Display) -> Result<Self> {
        Self::new(provider, name)
    }

    /// Bind `name` on `provider` acting as `identity`.
    pub fn with_identity(
        provider: P,
        name: impl fmt::Display,
        identity: LockIdentity,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            key: MutexKey::new(name)?,
            identity,
            release_on_drop: true,
        })
    }

    pub fn key(&self) -> &MutexKey {
        &self.key
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Our holder token.
    pub fn identity(&self) -> &str {
        self.identity.get()
    }

    /// Act as `token` from now on.
    pub fn set_identity(&mut self, token: impl Into<String>) -> Result<&mut Self> {
        self.identity.set(token)?;
        Ok(self)
    }

    pub fn release_on_drop(&self) -> bool {
        self.release_on_drop
    }

    /// Enable or suppress the unlock attempt made when the handle is dropped.
    pub fn set_release_on_drop(&mut self, enabled: bool) -> &mut Self {
        self.release_on_drop = enabled;
        self
    }

    /// Whether the stored holder is us.
    pub fn is_locked(&self) -> Result<bool> {
        let holder = self.provider.read(&self.key)?;
        Ok(holder.as_deref() == Some(self.identity()))
    }

    /// Claim the mutex for `expiry_secs` seconds (`0` = never expires).
    ///
    /// Succeeds if the claim is stored or the entry already belongs to us;
    /// in the latter case the existing expiry is left unchanged. Fails with
    /// [`MutexError::LockFailed`] when another identity holds it.
    pub fn lock(&self, expiry_secs: u64) -> Result<&Self> {
        if self
            .provider
            .try_claim(&self.key, self.identity(), expiry_secs)?
        {
            debug!(key = %self.key, expiry_secs, "mutex claimed");
            return Ok(self);
        }

        if self.is_locked()? {
            debug!(key = %self.key, "mutex already held by us");
            return Ok(self);
        }

        debug!(key = %self.key, "mutex held by another identity");
        Err(MutexError::LockFailed)
    }

    /// [`Mutex::lock`], reporting contention as `Ok(false)`.
    ///
    /// Provider failures still propagate.
    pub fn try_lock(&self, expiry_secs: u64) -> Result<bool> {
        match self.lock(expiry_secs) {
            Ok(_) => Ok(true),
            Err(MutexError::LockFailed) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove the entry if we hold it; otherwise do nothing.
    pub fn unlock(&self) -> Result<&Self> {
        if self.is_locked()? {
            self.provider.remove(&self.key)?;
            debug!(key = %self.key, "mutex released");
        }
        Ok(self)
    }

    /// Reset the expiry to `expiry_secs` from now if we hold the mutex.
    ///
    /// Not atomic: the entry may expire and be claimed by someone else
    /// between the ownership check and the rewrite, in which case their claim
    /// is overwritten. Treat it as best effort.
    pub fn touch(&self, expiry_secs: u64) -> Result<&Self> {
        if self.is_locked()? {
            self.provider
                .renew(&self.key, self.identity(), expiry_secs)?;
            debug!(key = %self.key, expiry_secs, "mutex renewed");
        }
        Ok(self)
    }

    /// The raw stored holder token, whoever it belongs to.
    pub fn locked_by(&self) -> Result<Option<String>> {
        Ok(self.provider.read(&self.key)?)
    }
}

impl<P: MutexProvider> fmt::Debug for Mutex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("key", &self.key)
            .field("identity", &self.identity())
            .field("release_on_drop", &self.release_on_drop)
            .finish_non_exhaustive()
    }
}

impl<P: MutexProvider> Drop for Mutex<P> {
    fn drop(&mut self) {
        if self.release_on_drop
            && let Err(e) = self.unlock()
        {
            warn!(key = %self.key, error = %e, "failed to release mutex on drop");
        }
    }
}
