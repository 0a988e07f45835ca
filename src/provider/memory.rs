//! In-process provider.
//!
//! Entries live in a [`MemoryStore`] that is handed to the provider rather
//! than kept in a global, so tests stay isolated and several providers can be
//! pointed at one store to play the part of separate clients of a shared cache.

use super::{MutexProvider, ttl};
use crate::error::ProviderResult;
use crate::key::MutexKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct MemoryEntry {
    token: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn new(token: &str, expiry_secs: u64) -> Self {
        Self {
            token: token.to_string(),
            expires_at: ttl(expiry_secs).and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Shared key/value table backing one or more [`MemoryProvider`]s.
///
/// Cloning a store yields a handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, MemoryEntry>> {
        // A panic while holding the table cannot leave an entry half written.
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Provider over an in-process [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    store: MemoryStore,
}

impl MemoryProvider {
    /// Provider with a private, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider over an existing store.
    pub fn with_store(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Drop the entry under `key` as if its TTL had run out.
    pub fn expire(&self, key: &MutexKey) {
        self.store.entries().remove(key.as_str());
    }
}

impl MutexProvider for MemoryProvider {
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool> {
        let now = Instant::now();
        let mut entries = self.store.entries();

        if let Some(existing) = entries.get(key.as_str())
            && existing.is_live(now)
        {
            debug!(key = %key, holder = %existing.token, "memory claim refused");
            return Ok(false);
        }

        entries.insert(key.as_str().to_string(), MemoryEntry::new(token, expiry_secs));
        Ok(true)
    }

    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.store.entries();

        match entries.get(key.as_str()) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.token.clone())),
            Some(_) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()> {
        self.store
            .entries()
            .insert(key.as_str().to_string(), MemoryEntry::new(token, expiry_secs));
        Ok(())
    }

    fn remove(&self, key: &MutexKey) -> ProviderResult<()> {
        self.store.entries().remove(key.as_str());
        Ok(())
    }
}
