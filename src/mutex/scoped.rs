//! Scoped acquisition: hold the mutex for the duration of a closure.

use super::Mutex;
use crate::error::MutexError;
use crate::provider::MutexProvider;
use std::fmt;
use tracing::warn;

/// Guard that unlocks its mutex when dropped, including during unwinding.
struct ReleaseGuard<'a, P: MutexProvider> {
    mutex: &'a Mutex<P>,

    /// Whether the mutex has been released manually.
    released: bool,
}

impl<'a, P: MutexProvider> ReleaseGuard<'a, P> {
    fn new(mutex: &'a Mutex<P>) -> Self {
        Self {
            mutex,
            released: false,
        }
    }

    /// Release now and report the outcome.
    fn release(mut self) -> Result<(), MutexError> {
        self.released = true;
        self.mutex.unlock().map(|_| ())
    }
}

impl<P: MutexProvider> Drop for ReleaseGuard<'_, P> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.mutex.unlock()
        {
            warn!(key = %self.mutex.key(), error = %e, "failed to release mutex");
        }
    }
}

impl<P: MutexProvider> Mutex<P> {
    /// Run `body` and unlock afterwards, whether it returns `Ok`, `Err` or
    /// panics.
    ///
    /// The caller is expected to hold the mutex already. If both the body and
    /// the unlock fail, the body's error wins and the unlock failure is logged.
    pub fn release_after<T, E, F>(&self, body: F) -> Result<T, E>
    where
        E: From<MutexError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        let guard = ReleaseGuard::new(self);
        let outcome = body(self);
        let released = guard.release();

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(unlock_err)) => {
                warn!(key = %self.key, error = %unlock_err, "failed to release mutex after error");
                Err(e)
            }
        }
    }
}

/// Lock `name` on `provider`, run `body` with the handle, then unlock.
///
/// Acquisition failures ([`MutexError::InvalidKey`], [`MutexError::LockFailed`],
/// provider errors) are returned before `body` runs. Once acquired, the mutex
/// is released on every exit path of `body`.
///
/// # Example
///
/// ```
/// use cache_mutex::{MemoryProvider, MutexError, with_lock};
///
/// let provider = MemoryProvider::new();
/// let total = with_lock(&provider, "nightly-report", 15, |mutex| {
///     assert!(mutex.is_locked()?);
///     Ok::<_, MutexError>(40 + 2)
/// })?;
/// assert_eq!(total, 42);
/// # Ok::<(), MutexError>(())
/// ```
pub fn with_lock<P, T, E, F>(
    provider: P,
    name: impl fmt::Display,
    expiry_secs: u64,
    body: F,
) -> Result<T, E>
where
    P: MutexProvider,
    E: From<MutexError>,
    F: FnOnce(&Mutex<P>) -> Result<T, E>,
{
    let mutex = Mutex::new(provider, name)?;
    mutex.lock(expiry_secs)?;
    mutex.release_after(body)
}
