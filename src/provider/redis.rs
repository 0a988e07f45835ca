//! Redis provider
//!
//! Networked cache backend. The claim maps onto `SET key token NX [EX ttl]`,
//! which Redis executes atomically, so independent hosts pointed at the same
//! server contend correctly.
//!
//! ## Example
//!
//! ```ignore
//! use cache_mutex::provider::RedisProvider;
//!
//! let provider = RedisProvider::new("redis://localhost:6379")?;
//! // Or with host/port
//! let provider = RedisProvider::with_host_port("localhost", 6379)?;
//! ```

use super::{MutexProvider, ttl};
use crate::error::{ProviderError, ProviderResult};
use crate::key::MutexKey;
use redis::{Client, Connection};
use tracing::debug;

/// Redis-backed provider.
#[derive(Clone)]
pub struct RedisProvider {
    client: Client,
}

impl std::fmt::Debug for RedisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisProvider").finish_non_exhaustive()
    }
}

fn backend(context: &str, e: redis::RedisError) -> ProviderError {
    ProviderError::Backend(format!("{}: {}", context, e))
}

impl RedisProvider {
    /// Create a provider from a connection URL (e.g. `redis://localhost:6379`).
    ///
    /// No connection is made until the first operation.
    pub fn new(connection_string: &str) -> ProviderResult<Self> {
        let client = Client::open(connection_string)
            .map_err(|e| backend("failed to create Redis client", e))?;
        Ok(Self { client })
    }

    /// Create a provider from host and port.
    pub fn with_host_port(host: &str, port: u16) -> ProviderResult<Self> {
        Self::new(&format!("redis://{}:{}", host, port))
    }

    fn connection(&self) -> ProviderResult<Connection> {
        self.client
            .get_connection()
            .map_err(|e| backend("failed to get Redis connection", e))
    }

    fn set_command(key: &MutexKey, token: &str, expiry_secs: u64) -> redis::Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key.as_str()).arg(token);
        if let Some(ttl) = ttl(expiry_secs) {
            cmd.arg("EX").arg(ttl.as_secs());
        }
        cmd
    }
}

impl MutexProvider for RedisProvider {
    fn try_claim(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<bool> {
        let mut conn = self.connection()?;
        let mut cmd = Self::set_command(key, token, expiry_secs);
        cmd.arg("NX");

        // SET NX replies OK when stored and nil when the key exists.
        let reply: Option<String> = cmd
            .query(&mut conn)
            .map_err(|e| backend("Redis SET NX failed", e))?;

        debug!(key = %key, claimed = reply.is_some(), "redis claim");
        Ok(reply.is_some())
    }

    fn read(&self, key: &MutexKey) -> ProviderResult<Option<String>> {
        let mut conn = self.connection()?;
        redis::cmd("GET")
            .arg(key.as_str())
            .query(&mut conn)
            .map_err(|e| backend("Redis GET failed", e))
    }

    fn renew(&self, key: &MutexKey, token: &str, expiry_secs: u64) -> ProviderResult<()> {
        let mut conn = self.connection()?;
        Self::set_command(key, token, expiry_secs)
            .query::<()>(&mut conn)
            .map_err(|e| backend("Redis SET failed", e))
    }

    fn remove(&self, key: &MutexKey) -> ProviderResult<()> {
        let mut conn = self.connection()?;
        redis::cmd("DEL")
            .arg(key.as_str())
            .query::<()>(&mut conn)
            .map_err(|e| backend("Redis DEL failed", e))
    }
}
