//! Implementation of the `lock`, `unlock` and `touch` commands.
//!
//! These span several invocations: `lock` prints the holder identity and
//! leaves the entry in place, and later calls hand that identity back to act
//! as the same holder.

use super::Session;
use crate::cli::{LockArgs, TouchArgs, UnlockArgs};
use cache_mutex::error::Result;
use cache_mutex::provider::MutexProvider;
use cache_mutex::{LockIdentity, Mutex};

/// Acquire a lock and print the holder identity.
pub fn cmd_lock(session: &Session, args: LockArgs) -> Result<()> {
    let token = acquire(session, &args)?;
    println!("{}", token);
    Ok(())
}

/// Release a lock held by `--identity`.
pub fn cmd_unlock(session: &Session, args: UnlockArgs) -> Result<()> {
    if release(session, &args)? {
        println!("Released lock '{}'.", args.name);
    } else {
        eprintln!(
            "Lock '{}' is not held by this identity; nothing to release.",
            args.name
        );
    }
    Ok(())
}

/// Renew a lock held by `--identity`.
pub fn cmd_touch(session: &Session, args: TouchArgs) -> Result<()> {
    let expiry = session.expiry(args.expiry);
    if renew(session, &args)? {
        println!("Renewed lock '{}' for {}s.", args.name, expiry);
    } else {
        eprintln!(
            "Lock '{}' is not held by this identity; nothing to renew.",
            args.name
        );
    }
    Ok(())
}

/// Wait for the lock and return the token it is held under.
pub(super) fn acquire(session: &Session, args: &LockArgs) -> Result<String> {
    let provider = session.provider()?;
    let mutex = detached(provider.as_ref(), &args.name, args.identity.as_deref())?;

    mutex.wait_lock(
        session.wait(args.wait),
        session.expiry(args.expiry),
        session.config.max_sleep(),
    )?;
    Ok(mutex.identity().to_string())
}

/// Unlock as `args.identity`; returns whether the lock was ours.
pub(super) fn release(session: &Session, args: &UnlockArgs) -> Result<bool> {
    let provider = session.provider()?;
    let mutex = detached(provider.as_ref(), &args.name, Some(&args.identity))?;

    let held = mutex.is_locked()?;
    mutex.unlock()?;
    Ok(held)
}

/// Touch as `args.identity`; returns whether the lock was ours.
pub(super) fn renew(session: &Session, args: &TouchArgs) -> Result<bool> {
    let provider = session.provider()?;
    let mutex = detached(provider.as_ref(), &args.name, Some(&args.identity))?;

    let held = mutex.is_locked()?;
    mutex.touch(session.expiry(args.expiry))?;
    Ok(held)
}

/// A handle that leaves the entry alone when dropped.
fn detached<'a>(
    provider: &'a dyn MutexProvider,
    name: &str,
    identity: Option<&str>,
) -> Result<Mutex<&'a dyn MutexProvider>> {
    let identity = match identity {
        Some(token) => LockIdentity::from_token(token)?,
        None => LockIdentity::new(),
    };

    let mut mutex = Mutex::with_identity(provider, name, identity)?;
    mutex.set_release_on_drop(false);
    Ok(mutex)
}
