//! Command implementations for cache-mutex.
//!
//! This module resolves the active configuration into a [`Session`] and
//! routes CLI commands to their handlers.

mod lock;
mod run;
mod status;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command};
use cache_mutex::WaitTimeout;
use cache_mutex::config::{Backend, Config};
use cache_mutex::error::Result;
use cache_mutex::provider::{FileProvider, MemoryProvider, MutexProvider};
use tracing::{debug, warn};

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolve the config and apply the backend overrides given on the
    /// command line.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::resolve(cli.config.as_deref())?;

        if let Some(dir) = &cli.dir {
            config.backend = Backend::File { dir: dir.clone() };
        }
        if let Some(url) = &cli.redis {
            config.backend = Backend::Redis { url: url.clone() };
        }

        config.validate()?;
        Ok(Self::new(config))
    }

    /// Open the configured backend.
    pub fn provider(&self) -> Result<Box<dyn MutexProvider>> {
        debug!(backend = self.config.backend.as_str(), "opening backend");
        match &self.config.backend {
            Backend::Memory => {
                warn!("memory backend does not outlive this process");
                Ok(Box::new(MemoryProvider::new()))
            }
            Backend::File { dir } => Ok(Box::new(FileProvider::new(dir))),
            Backend::Redis { url } => open_redis(url),
        }
    }

    /// Expiry to use when the command line gives none.
    pub fn expiry(&self, explicit: Option<u64>) -> u64 {
        explicit.unwrap_or(self.config.default_expiry_secs)
    }

    /// Wait to use when the command line gives none.
    pub fn wait(&self, explicit: Option<i64>) -> WaitTimeout {
        explicit
            .map(WaitTimeout::from_millis)
            .unwrap_or_else(|| self.config.wait_timeout())
    }
}

#[cfg(feature = "redis")]
fn open_redis(url: &str) -> Result<Box<dyn MutexProvider>> {
    let provider = cache_mutex::provider::RedisProvider::new(url)?;
    Ok(Box::new(provider))
}

#[cfg(not(feature = "redis"))]
fn open_redis(_url: &str) -> Result<Box<dyn MutexProvider>> {
    Err(cache_mutex::MutexError::Config(
        "the redis backend requires building with the `redis` feature".to_string(),
    ))
}

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let session = Session::from_cli(&cli)?;

    match cli.command {
        Command::Lock(args) => lock::cmd_lock(&session, args),
        Command::Unlock(args) => lock::cmd_unlock(&session, args),
        Command::Touch(args) => lock::cmd_touch(&session, args),
        Command::Status(args) => status::cmd_status(&session, args),
        Command::List => status::cmd_list(&session),
        Command::Run(args) => run::cmd_run(&session, args),
    }
}
