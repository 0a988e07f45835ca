//! Blocking acquisition.
//!
//! `wait_lock` is a client-side poll: it retries [`Mutex::lock`] with a
//! randomized pause until the claim succeeds or the timeout passes. Waiters
//! get no ordering guarantee, and a crashed holder only goes away when the
//! backend expires its entry.

use super::Mutex;
use crate::error::{MutexError, Result};
use crate::provider::MutexProvider;
use rand::Rng;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Lower bound on the pause ceiling for bounded waits.
const MIN_PAUSE_CEILING: Duration = Duration::from_millis(500);

/// How long [`Mutex::wait_lock`] keeps retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// One attempt, no retry.
    NoWait,
    /// Retry until this much wall-clock time has passed.
    Bounded(Duration),
    /// Retry until the lock is acquired.
    Forever,
}

impl WaitTimeout {
    /// Interpret a millisecond count: `0` is no wait, negative is forever.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            0 => WaitTimeout::NoWait,
            m if m < 0 => WaitTimeout::Forever,
            m => WaitTimeout::Bounded(Duration::from_millis(m.unsigned_abs())),
        }
    }

    /// Upper bound of one pause between attempts.
    ///
    /// `min(max(500ms, timeout), max_sleep)` for bounded waits, `max_sleep`
    /// when waiting forever, never below one millisecond.
    pub fn pause_ceiling(&self, max_sleep: Duration) -> Duration {
        let ceiling = match self {
            WaitTimeout::NoWait => Duration::ZERO,
            WaitTimeout::Bounded(limit) => (*limit).max(MIN_PAUSE_CEILING).min(max_sleep),
            WaitTimeout::Forever => max_sleep,
        };
        ceiling.max(Duration::from_millis(1))
    }
}

impl From<i64> for WaitTimeout {
    fn from(millis: i64) -> Self {
        WaitTimeout::from_millis(millis)
    }
}

impl From<Duration> for WaitTimeout {
    fn from(limit: Duration) -> Self {
        if limit.is_zero() {
            WaitTimeout::NoWait
        } else {
            WaitTimeout::Bounded(limit)
        }
    }
}

/// A random pause in `[1ms, ceiling]`.
fn random_pause(ceiling: Duration) -> Duration {
    let upper = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX).max(1);
    Duration::from_millis(rand::rng().random_range(1..=upper))
}

impl<P: MutexProvider> Mutex<P> {
    /// Retry [`Mutex::lock`] until it succeeds or `timeout` passes.
    ///
    /// On timeout the last [`MutexError::LockFailed`] is returned, never
    /// before `timeout` has elapsed. Provider failures end the wait at once.
    pub fn wait_lock(
        &self,
        timeout: WaitTimeout,
        expiry_secs: u64,
        max_sleep: Duration,
    ) -> Result<&Self> {
        let ceiling = timeout.pause_ceiling(max_sleep);
        let start = Instant::now();
        let mut attempts = 0u32;

        while !self.is_locked()? {
            attempts += 1;
            match self.lock(expiry_secs) {
                Ok(_) => break,
                Err(MutexError::LockFailed) => {}
                Err(e) => return Err(e),
            }

            let pause = match timeout {
                WaitTimeout::NoWait => return Err(MutexError::LockFailed),
                WaitTimeout::Bounded(limit) => {
                    let elapsed = start.elapsed();
                    if elapsed >= limit {
                        debug!(key = %self.key, attempts, "wait for mutex timed out");
                        return Err(MutexError::LockFailed);
                    }
                    random_pause(ceiling).min(limit - elapsed)
                }
                WaitTimeout::Forever => random_pause(ceiling),
            };

            debug!(key = %self.key, attempts, pause_ms = pause.as_millis() as u64, "mutex busy, retrying");
            thread::sleep(pause);
        }

        Ok(self)
    }
}
