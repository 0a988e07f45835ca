//! Implementation of the `status` and `list` commands.

use super::Session;
use crate::cli::StatusArgs;
use cache_mutex::Mutex;
use cache_mutex::config::Backend;
use cache_mutex::error::{MutexError, Result};
use cache_mutex::provider::{FileProvider, LockRecord};

/// Print who holds a lock.
pub fn cmd_status(session: &Session, args: StatusArgs) -> Result<()> {
    match holder(session, &args.name)? {
        Some(token) => println!("{}: locked by {}", args.name, token),
        None => println!("{}: unlocked", args.name),
    }
    Ok(())
}

/// Print every live lock in the lock directory.
pub fn cmd_list(session: &Session) -> Result<()> {
    let records = records(session)?;

    if records.is_empty() {
        println!("No locks held.");
        return Ok(());
    }

    println!("Held locks ({}):", records.len());
    for record in &records {
        println!("  {}", record);
    }
    Ok(())
}

/// The token stored for `name`, if any.
pub(super) fn holder(session: &Session, name: &str) -> Result<Option<String>> {
    let provider = session.provider()?;
    let mut mutex = Mutex::new(provider.as_ref(), name)?;
    mutex.set_release_on_drop(false);
    mutex.locked_by()
}

/// Live records; only the file backend can enumerate its entries.
pub(super) fn records(session: &Session) -> Result<Vec<LockRecord>> {
    match &session.config.backend {
        Backend::File { dir } => Ok(FileProvider::new(dir).list()?),
        other => Err(MutexError::Command(format!(
            "list is not supported by the {} backend",
            other.as_str()
        ))),
    }
}
