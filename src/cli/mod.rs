//! CLI argument parsing for cache-mutex.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cache-mutex: named locks shared between processes through a cache.
///
/// Locks live in a backend (a lock directory or a Redis server) so separate
/// processes, on one machine or many, can serialize work on a named resource.
#[derive(Parser, Debug)]
#[command(name = "cache-mutex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file (falls back to $CACHE_MUTEX_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a lock directory, overriding the configured backend.
    #[arg(long, global = true, conflicts_with = "redis")]
    pub dir: Option<PathBuf>,

    /// Use a Redis server URL, overriding the configured backend.
    #[arg(long, global = true)]
    pub redis: Option<String>,

    /// Log protocol steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cache-mutex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Acquire a lock and keep it after exiting.
    ///
    /// Prints the holder identity; pass it to `unlock` or `touch` later.
    Lock(LockArgs),

    /// Release a lock held by the given identity.
    Unlock(UnlockArgs),

    /// Renew the expiry of a lock held by the given identity.
    Touch(TouchArgs),

    /// Show who holds a lock.
    Status(StatusArgs),

    /// List held locks (file backend only).
    List,

    /// Run a command while holding a lock.
    ///
    /// The lock is renewed while the command runs and released when it
    /// exits, whatever its status.
    Run(RunArgs),
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Name of the lock.
    pub name: String,

    /// Seconds until the lock expires (0 = never).
    #[arg(long)]
    pub expiry: Option<u64>,

    /// Milliseconds to wait for a busy lock (0 = no wait, negative = forever).
    #[arg(long, allow_negative_numbers = true)]
    pub wait: Option<i64>,

    /// Act as this identity instead of generating one.
    #[arg(long)]
    pub identity: Option<String>,
}

/// Arguments for the `unlock` command.
#[derive(Parser, Debug)]
pub struct UnlockArgs {
    /// Name of the lock.
    pub name: String,

    /// Identity printed by `lock`.
    #[arg(long)]
    pub identity: String,
}

/// Arguments for the `touch` command.
#[derive(Parser, Debug)]
pub struct TouchArgs {
    /// Name of the lock.
    pub name: String,

    /// Identity printed by `lock`.
    #[arg(long)]
    pub identity: String,

    /// Seconds from now until the lock expires (0 = never).
    #[arg(long)]
    pub expiry: Option<u64>,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Name of the lock.
    pub name: String,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Name of the lock.
    pub name: String,

    /// Command line to execute (shell-words quoting, no shell).
    pub command: String,

    /// Seconds until the lock expires if not renewed (0 = never).
    #[arg(long)]
    pub expiry: Option<u64>,

    /// Milliseconds to wait for a busy lock (0 = no wait, negative = forever).
    #[arg(long, allow_negative_numbers = true)]
    pub wait: Option<i64>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
