//! File-backed provider.
//!
//! Each key maps to one record file, `<sha256(key)>.lock`, inside a lock
//! directory. Hashing keeps file names short and free of path separators
//! whatever the mutex name contains.
//!
//! # Claiming
//!
//! A claim publishes a fully written record with exclusive-create semantics,
//! so only one claimant can own a given entry at a time. Any process on the
//! same host, or on any host sharing a filesystem with atomic hard links, can
//! coordinate through the same directory.
//!
//! # Expiry
//!
//! Files do not expire on their own. A record whose `expires_at` has passed
//! reads as absent, and the next claim reaps it. Reaping holds an exclusive
//! lock on a per-key `.reap` sidecar and only deletes the entry if it still
//! holds the very record found stale, so a reaper that read an old record can
//! never delete an entry another claimant has since published.

mod record;

#[cfg(test)]
mod tests;

pub use record::LockRecord;

use super::MutexProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::fs::{atomic_write, publish_exclusive};
use crate::key::MutexKey;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Claim attempts per call; a retry is only needed after reaping a stale entry.
const CLAIM_ATTEMPTS: usize = 3;

/// Provider storing lock records as files in a directory.
#[derive(Debug, Clone)]
pub struct FileProvider {
    dir: PathBuf,
}

impl FileProvider {
    /// Provider over `dir`. The directory is created on the first claim.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The lock directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `key`.
    pub fn entry_path(&self, key: &MutexKey) -> PathBuf {
        let digest = Sha256::digest(key.as_str().as_bytes());
        self.dir.join(format!("{}.lock", hex::encode(digest)))
    }

    /// All live records in the directory, sorted by key.
    ///
    /// Unreadable or expired records are skipped.
    pub fn list(&self) -> ProviderResult<Vec<LockRecord>> {
        let mut records = Vec::new();

        if !self.dir.exists() {
            return Ok(records);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| ProviderError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ProviderError::io(&self.dir, e))?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("lock") {
                continue;
            }

            match LockRecord::from_file(&path) {
                Ok(Some(record)) if !record.is_expired() => records.push(record),
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable lock record"),
            }
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    /// Path of the sidecar file serializing reaps of `entry`.
    fn reap_lock_path(entry: &Path) -> PathBuf {
        entry.with_extension("reap")
    }

    /// Delete the entry at `path` if it still holds `stale`.
    ///
    /// The sidecar is never deleted; removing it would let two reapers lock
    /// different files for the same entry.
    fn reap(&self, path: &Path, stale: &LockRecord) -> ProviderResult<()> {
        let lock_path = Self::reap_lock_path(path);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ProviderError::io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| ProviderError::io(&lock_path, e))?;

        match LockRecord::from_file(path)? {
            Some(current) if current == *stale => match fs::remove_file(path) {
                Ok(()) => {
                    debug!(key = %stale.key, holder = %stale.token, "reaped expired record");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(ProviderError::io(path, e)),
            },
            Some(current) => {
                debug!(key = %current.key, holder = %current.token, "expired record already replaced");
            }
            None => {}
        }

        // Closing the sidecar releases the lock.
        drop(lock_file);
        Ok(())
    }
}

impl MutexProvider for FileProvider {
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool> {
        let path = self.entry_path(key);
        let json = LockRecord::new(key.as_str(), token, expiry_secs).to_json()?;

        for _ in 0..CLAIM_ATTEMPTS {
            if publish_exclusive(&path, json.as_bytes())? {
                return Ok(true);
            }

            match LockRecord::from_file(&path)? {
                // Removed between our publish and read; try again.
                None => continue,
                Some(existing) if existing.is_expired() => self.reap(&path, &existing)?,
                Some(existing) => {
                    debug!(key = %key, holder = %existing.token, "file claim refused");
                    return Ok(false);
                }
            }
        }

        publish_exclusive(&path, json.as_bytes())
    }

    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>> {
        let record = LockRecord::from_file(self.entry_path(key))?;
        Ok(record
            .filter(|record| !record.is_expired())
            .map(|record| record.token))
    }

    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()> {
        let json = LockRecord::new(key.as_str(), token, expiry_secs).to_json()?;
        atomic_write(self.entry_path(key), json.as_bytes())
    }

    fn remove(&self, key: &MutexKey) -> ProviderResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProviderError::io(path, e)),
        }
    }
}
