//! Tests for command implementations.

use super::Session;
use super::lock::{acquire, release, renew};
use super::run::{cmd_run, parse_command, renew_if_held, renewal_interval};
use super::status::{holder, records};
use crate::cli::{Cli, LockArgs, RunArgs, TouchArgs, UnlockArgs};
use cache_mutex::config::{Backend, Config};
use cache_mutex::error::MutexError;
use cache_mutex::{MemoryProvider, Mutex};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// A session over a fresh lock directory.
fn file_session() -> (TempDir, Session) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        backend: Backend::File {
            dir: temp_dir.path().join("locks"),
        },
        ..Config::default()
    };
    (temp_dir, Session::new(config))
}

fn lock_args(name: &str) -> LockArgs {
    LockArgs {
        name: name.to_string(),
        expiry: None,
        wait: None,
        identity: None,
    }
}

fn unlock_args(name: &str, identity: &str) -> UnlockArgs {
    UnlockArgs {
        name: name.to_string(),
        identity: identity.to_string(),
    }
}

#[test]
fn test_lock_status_unlock_across_invocations() {
    let (_temp_dir, session) = file_session();

    let token = acquire(&session, &lock_args("nightly")).unwrap();
    assert_eq!(holder(&session, "nightly").unwrap(), Some(token.clone()));

    assert!(release(&session, &unlock_args("nightly", &token)).unwrap());
    assert_eq!(holder(&session, "nightly").unwrap(), None);
}

#[test]
fn test_lock_contention_fails() {
    let (_temp_dir, session) = file_session();

    acquire(&session, &lock_args("nightly")).unwrap();
    let err = acquire(&session, &lock_args("nightly")).unwrap_err();
    assert!(err.is_lock_failed());
}

#[test]
fn test_lock_with_identity_is_reentrant() {
    let (_temp_dir, session) = file_session();

    let token = acquire(&session, &lock_args("nightly")).unwrap();
    let mut again = lock_args("nightly");
    again.identity = Some(token.clone());

    assert_eq!(acquire(&session, &again).unwrap(), token);
}

#[test]
fn test_lock_bounded_wait_times_out() {
    let (_temp_dir, mut session) = file_session();
    session.config.max_sleep_ms = 20;

    acquire(&session, &lock_args("busy")).unwrap();

    let mut waiting = lock_args("busy");
    waiting.wait = Some(100);
    let err = acquire(&session, &waiting).unwrap_err();
    assert!(err.is_lock_failed());
}

#[test]
fn test_unlock_with_wrong_identity_keeps_lock() {
    let (_temp_dir, session) = file_session();

    let token = acquire(&session, &lock_args("nightly")).unwrap();
    assert!(!release(&session, &unlock_args("nightly", "someone-else")).unwrap());
    assert_eq!(holder(&session, "nightly").unwrap(), Some(token));
}

#[test]
fn test_touch_reports_ownership() {
    let (_temp_dir, session) = file_session();
    let token = acquire(&session, &lock_args("nightly")).unwrap();

    let touch = |identity: &str| TouchArgs {
        name: "nightly".to_string(),
        identity: identity.to_string(),
        expiry: Some(60),
    };

    assert!(renew(&session, &touch(&token)).unwrap());
    assert!(!renew(&session, &touch("someone-else")).unwrap());
    assert_eq!(holder(&session, "nightly").unwrap(), Some(token));
}

#[test]
fn test_invalid_name_is_rejected() {
    let (_temp_dir, session) = file_session();
    let err = acquire(&session, &lock_args("two words")).unwrap_err();
    assert!(matches!(err, MutexError::InvalidKey { .. }));
}

#[test]
fn test_list_file_backend() {
    let (_temp_dir, session) = file_session();
    assert!(records(&session).unwrap().is_empty());

    acquire(&session, &lock_args("b-job")).unwrap();
    acquire(&session, &lock_args("a-job")).unwrap();

    let keys: Vec<_> = records(&session)
        .unwrap()
        .into_iter()
        .map(|record| record.key)
        .collect();
    assert_eq!(keys, vec!["MUTEX:a-job", "MUTEX:b-job"]);
}

#[test]
fn test_list_unsupported_on_memory_backend() {
    let session = Session::new(Config {
        backend: Backend::Memory,
        ..Config::default()
    });

    let err = records(&session).unwrap_err();
    assert!(matches!(err, MutexError::Command(_)));
    assert!(err.to_string().contains("memory"));
}

#[cfg(not(feature = "redis"))]
#[test]
fn test_redis_backend_requires_feature() {
    let session = Session::new(Config {
        backend: Backend::Redis {
            url: "redis://localhost:6379".to_string(),
        },
        ..Config::default()
    });

    assert!(matches!(session.provider(), Err(MutexError::Config(_))));
}

#[test]
fn test_session_defaults_and_overrides() {
    let (_temp_dir, session) = file_session();

    assert_eq!(session.expiry(None), 15);
    assert_eq!(session.expiry(Some(0)), 0);
    assert_eq!(session.wait(None), cache_mutex::WaitTimeout::NoWait);
    assert_eq!(session.wait(Some(-1)), cache_mutex::WaitTimeout::Forever);
}

#[test]
fn test_session_from_cli_dir_override() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        "default_expiry_secs: 42\nbackend:\n  type: memory\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "cache-mutex",
        "--config",
        config_path.to_str().unwrap(),
        "--dir",
        "/tmp/cache-mutex-test",
        "list",
    ])
    .unwrap();
    let session = Session::from_cli(&cli).unwrap();

    assert_eq!(session.config.default_expiry_secs, 42);
    assert_eq!(
        session.config.backend,
        Backend::File {
            dir: PathBuf::from("/tmp/cache-mutex-test")
        }
    );
}

#[test]
fn test_session_from_cli_redis_override() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(&config_path, "").unwrap();

    let cli = Cli::try_parse_from([
        "cache-mutex",
        "--config",
        config_path.to_str().unwrap(),
        "--redis",
        "redis://cache:6379",
        "list",
    ])
    .unwrap();
    let session = Session::from_cli(&cli).unwrap();

    assert_eq!(session.config.backend.as_str(), "redis");
}

#[test]
fn test_parse_command() {
    assert_eq!(
        parse_command("make release TARGET='a b'").unwrap(),
        vec!["make", "release", "TARGET=a b"]
    );

    let err = parse_command("echo 'unterminated").unwrap_err();
    assert!(err.to_string().contains("failed to parse command"));

    assert!(matches!(parse_command("   "), Err(MutexError::Command(_))));
}

#[test]
fn test_renewal_interval() {
    assert_eq!(renewal_interval(0), None);
    assert_eq!(renewal_interval(15), Some(Duration::from_secs(5)));
    assert_eq!(renewal_interval(3), Some(Duration::from_secs(1)));
    assert_eq!(renewal_interval(1), Some(Duration::from_secs(1) / 3));
    assert!(renewal_interval(u64::MAX).is_some());
}

#[test]
fn test_renewal_detects_lost_lock() {
    let provider = MemoryProvider::new();
    let mutex = Mutex::new(&provider, "deploy").unwrap();
    mutex.lock(15).unwrap();

    assert!(renew_if_held(&mutex, 15).unwrap());

    provider.expire(mutex.key());
    assert!(!renew_if_held(&mutex, 15).unwrap());
    assert_eq!(mutex.locked_by().unwrap(), None);
}

fn run_args(name: &str, command: &str) -> RunArgs {
    RunArgs {
        name: name.to_string(),
        command: command.to_string(),
        expiry: None,
        wait: None,
    }
}

#[cfg(unix)]
#[test]
fn test_run_releases_lock_after_success() {
    let (_temp_dir, session) = file_session();

    cmd_run(&session, run_args("deploy", "true")).unwrap();
    assert_eq!(holder(&session, "deploy").unwrap(), None);
}

#[cfg(unix)]
#[test]
fn test_run_reports_failure_and_releases_lock() {
    let (_temp_dir, session) = file_session();

    let err = cmd_run(&session, run_args("deploy", "false")).unwrap_err();
    assert!(matches!(err, MutexError::CommandFailed { code: 1 }));
    assert_eq!(holder(&session, "deploy").unwrap(), None);
}

#[cfg(unix)]
#[test]
fn test_run_does_not_start_when_lock_is_busy() {
    let (temp_dir, session) = file_session();
    let marker = temp_dir.path().join("ran");

    let token = acquire(&session, &lock_args("deploy")).unwrap();
    let command = format!("touch {}", marker.display());

    let err = cmd_run(&session, run_args("deploy", &command)).unwrap_err();
    assert!(err.is_lock_failed());
    assert!(!marker.exists());
    assert_eq!(holder(&session, "deploy").unwrap(), Some(token));
}

#[test]
fn test_run_missing_program() {
    let (_temp_dir, session) = file_session();

    let err = cmd_run(
        &session,
        run_args("deploy", "cache-mutex-no-such-program-xyz"),
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to execute command"));
    assert_eq!(holder(&session, "deploy").unwrap(), None);
}
