//! Implementation of the `run` command.
//!
//! Runs a child process while holding a lock. The lock is renewed at a third
//! of its expiry for as long as the child runs and released when it exits.

use super::Session;
use crate::cli::RunArgs;
use cache_mutex::Mutex;
use cache_mutex::error::{MutexError, Result};
use cache_mutex::provider::MutexProvider;
use std::process::Command as Process;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the child is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Acquire the lock, run the command, release the lock.
pub fn cmd_run(session: &Session, args: RunArgs) -> Result<()> {
    let argv = parse_command(&args.command)?;
    let expiry = session.expiry(args.expiry);

    let provider = session.provider()?;
    let mutex = Mutex::new(provider.as_ref(), &args.name)?;
    mutex.wait_lock(
        session.wait(args.wait),
        expiry,
        session.config.max_sleep(),
    )?;
    info!(lock = %args.name, identity = mutex.identity(), "lock acquired, starting command");

    mutex.release_after(|mutex| supervise(mutex, &argv, expiry))
}

/// Split a command line into program and arguments.
pub(super) fn parse_command(command: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(command).map_err(|e| {
        MutexError::Command(format!(
            "failed to parse command: {}\nCommand: {}\nFix: check for unmatched quotes or invalid escape sequences.",
            e, command
        ))
    })?;

    if argv.is_empty() {
        return Err(MutexError::Command("command is empty".to_string()));
    }
    Ok(argv)
}

/// How often to renew a lock with the given expiry; `None` if it never
/// expires.
pub(super) fn renewal_interval(expiry_secs: u64) -> Option<Duration> {
    (expiry_secs > 0).then(|| (Duration::from_secs(expiry_secs) / 3).max(POLL_INTERVAL))
}

/// Renew `mutex` and report whether we still hold it afterwards.
///
/// `false` means the lock expired or was taken over; `touch` does not bring
/// it back.
pub(super) fn renew_if_held<P: MutexProvider>(
    mutex: &Mutex<P>,
    expiry_secs: u64,
) -> Result<bool> {
    mutex.touch(expiry_secs)?;
    mutex.is_locked()
}

/// Run `argv` to completion, renewing `mutex` while it runs.
fn supervise<P: MutexProvider>(
    mutex: &Mutex<P>,
    argv: &[String],
    expiry_secs: u64,
) -> Result<()> {
    let (program, program_args) = argv
        .split_first()
        .ok_or_else(|| MutexError::Command("command is empty".to_string()))?;

    let mut child = Process::new(program).args(program_args).spawn().map_err(|e| {
        MutexError::Command(format!(
            "failed to execute command: {}\nCommand: {}\nFix: ensure the command is installed and in PATH.",
            e, program
        ))
    })?;

    let interval = renewal_interval(expiry_secs);
    let mut last_renewal = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                return Err(MutexError::Command(format!(
                    "failed to wait for command: {}",
                    e
                )));
            }
        }

        if let Some(interval) = interval
            && last_renewal.elapsed() >= interval
        {
            match renew_if_held(mutex, expiry_secs) {
                Ok(true) => debug!(key = %mutex.key(), "lock renewed while command runs"),
                Ok(false) => warn!(
                    key = %mutex.key(),
                    "lock lost while command runs; it is no longer protected"
                ),
                Err(e) => warn!(key = %mutex.key(), error = %e, "failed to renew lock"),
            }
            last_renewal = Instant::now();
        }

        thread::sleep(POLL_INTERVAL);
    };

    if status.success() {
        Ok(())
    } else {
        Err(MutexError::CommandFailed {
            code: status.code().unwrap_or(-1),
        })
    }
}
