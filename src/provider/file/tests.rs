//! Tests for the file-backed provider.

use super::*;
use crate::test_support::file_provider;
use chrono::{Duration, Utc};
use std::sync::{Arc, Barrier};

fn key(name: &str) -> MutexKey {
    MutexKey::new(name).unwrap()
}

/// Write a record straight to disk, bypassing the provider.
fn plant(provider: &FileProvider, record: &LockRecord) {
    let key = key(record.key.trim_start_matches(crate::key::MUTEX_PREFIX));
    fs::create_dir_all(provider.dir()).unwrap();
    fs::write(provider.entry_path(&key), record.to_json().unwrap()).unwrap();
}

#[test]
fn test_record_creation() {
    let record = LockRecord::new("MUTEX:job", "token-1", 0);

    assert!(!record.owner.is_empty());
    assert_eq!(record.pid, Some(std::process::id()));
    assert_eq!(record.expires_at, None);
    assert!(!record.is_expired());
}

#[test]
fn test_record_serialization() {
    let record = LockRecord::new("MUTEX:job", "token-1", 30);
    let json = record.to_json().unwrap();

    assert!(json.contains("\"token\""));
    assert!(json.contains("\"expires_at\""));

    let parsed: LockRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn test_record_without_expiry_omits_field() {
    let json = LockRecord::new("MUTEX:job", "token-1", 0).to_json().unwrap();
    assert!(!json.contains("expires_at"));
}

#[test]
fn test_record_age_string() {
    let mut record = LockRecord::new("MUTEX:job", "t", 0);
    assert!(record.age_string().ends_with('s'));

    record.created_at = Utc::now() - Duration::minutes(5);
    assert!(record.age_string().starts_with("5m"));

    record.created_at = Utc::now() - Duration::hours(2);
    assert!(record.age_string().contains('h'));

    record.created_at = Utc::now() - Duration::days(3);
    assert!(record.age_string().contains('d'));
}

#[test]
fn test_record_with_huge_expiry_never_expires() {
    let record = LockRecord::new("MUTEX:job", "token-1", 10_000_000_000_000);
    assert_eq!(record.expires_at, None);

    let record = LockRecord::new("MUTEX:job", "token-1", crate::provider::MAX_EXPIRY_SECS);
    assert!(record.expires_at.is_some());
    assert!(!record.is_expired());
}

#[test]
fn test_claim_with_huge_expiry() {
    let (_temp_dir, provider) = file_provider();
    let key = key("huge");

    assert!(provider.try_claim(&key, "token-1", u64::MAX).unwrap());
    assert_eq!(provider.read(&key).unwrap().as_deref(), Some("token-1"));
}

#[test]
fn test_record_display() {
    let record = LockRecord::new("MUTEX:nightly", "host:1@abc", 0);
    let shown = record.to_string();

    assert!(shown.starts_with("nightly (holder: host:1@abc, owner: "));
    assert!(shown.ends_with("never expires)"));
}

#[test]
fn test_record_expiry_boundary() {
    let record = LockRecord::new("MUTEX:job", "t", 10);
    let expires_at = record.expires_at.unwrap();

    assert!(!record.is_expired_at(expires_at - Duration::milliseconds(1)));
    assert!(record.is_expired_at(expires_at));
}

#[test]
fn test_claim_writes_record() {
    let (_temp_dir, provider) = file_provider();
    let key = key("claim");

    assert!(provider.try_claim(&key, "token-1", 15).unwrap());

    let path = provider.entry_path(&key);
    assert!(path.exists());
    let record = LockRecord::from_file(&path).unwrap().unwrap();
    assert_eq!(record.key, "MUTEX:claim");
    assert_eq!(record.token, "token-1");
    assert!(record.expires_at.is_some());
}

#[test]
fn test_claim_same_key_twice_fails() {
    let (_temp_dir, provider) = file_provider();
    let key = key("contended");

    assert!(provider.try_claim(&key, "first", 0).unwrap());
    assert!(!provider.try_claim(&key, "second", 0).unwrap());
    assert_eq!(provider.read(&key).unwrap().as_deref(), Some("first"));

    provider.remove(&key).unwrap();
    assert!(provider.try_claim(&key, "third", 0).unwrap());
}

#[test]
fn test_expired_record_reads_as_absent() {
    let (_temp_dir, provider) = file_provider();
    let mut record = LockRecord::new("MUTEX:stale", "dead-process", 5);
    record.expires_at = Some(Utc::now() - Duration::seconds(1));
    plant(&provider, &record);

    assert_eq!(provider.read(&key("stale")).unwrap(), None);
}

#[test]
fn test_claim_reaps_expired_record() {
    let (_temp_dir, provider) = file_provider();
    let mut record = LockRecord::new("MUTEX:stale", "dead-process", 5);
    record.expires_at = Some(Utc::now() - Duration::seconds(1));
    plant(&provider, &record);

    let key = key("stale");
    assert!(provider.try_claim(&key, "survivor", 5).unwrap());
    assert_eq!(provider.read(&key).unwrap().as_deref(), Some("survivor"));
}

#[test]
fn test_reap_leaves_replaced_record() {
    let (_temp_dir, provider) = file_provider();
    let key = key("swapped");

    let mut stale = LockRecord::new("MUTEX:swapped", "dead-process", 5);
    stale.expires_at = Some(Utc::now() - Duration::seconds(1));

    // Someone else already replaced the stale record with a live one.
    assert!(provider.try_claim(&key, "fresh", 30).unwrap());
    let path = provider.entry_path(&key);
    provider.reap(&path, &stale).unwrap();

    assert_eq!(provider.read(&key).unwrap().as_deref(), Some("fresh"));
}

#[test]
fn test_reap_removes_matching_record() {
    let (_temp_dir, provider) = file_provider();
    let mut stale = LockRecord::new("MUTEX:reaped", "dead-process", 5);
    stale.expires_at = Some(Utc::now() - Duration::seconds(1));
    plant(&provider, &stale);

    let path = provider.entry_path(&key("reaped"));
    provider.reap(&path, &stale).unwrap();

    assert!(!path.exists());
    assert!(path.with_extension("reap").exists());
}

#[test]
fn test_renew_rewrites_record() {
    let (_temp_dir, provider) = file_provider();
    let key = key("renew");

    provider.try_claim(&key, "token-1", 1).unwrap();
    let before = LockRecord::from_file(provider.entry_path(&key))
        .unwrap()
        .unwrap();

    provider.renew(&key, "token-1", 0).unwrap();
    let after = LockRecord::from_file(provider.entry_path(&key))
        .unwrap()
        .unwrap();

    assert!(before.expires_at.is_some());
    assert_eq!(after.expires_at, None);
    assert_eq!(after.token, "token-1");
}

#[test]
fn test_remove_missing_entry_is_ok() {
    let (_temp_dir, provider) = file_provider();
    provider.remove(&key("never-claimed")).unwrap();
}

#[test]
fn test_corrupt_record_is_reported() {
    let (_temp_dir, provider) = file_provider();
    let key = key("corrupt");
    fs::create_dir_all(provider.dir()).unwrap();
    fs::write(provider.entry_path(&key), "not json").unwrap();

    let err = provider.read(&key).unwrap_err();
    assert!(matches!(err, ProviderError::Corrupt { .. }));
}

#[test]
fn test_entry_path_is_flat() {
    let (_temp_dir, provider) = file_provider();
    let path = provider.entry_path(&key("jobs/nightly/../report"));

    assert_eq!(path.parent().unwrap(), provider.dir());
    let name = path.file_name().unwrap().to_str().unwrap();
    assert_eq!(name.len(), 64 + ".lock".len());
}

#[test]
fn test_list_records() {
    let (_temp_dir, provider) = file_provider();

    assert!(provider.list().unwrap().is_empty());

    provider.try_claim(&key("b-job"), "t2", 0).unwrap();
    provider.try_claim(&key("a-job"), "t1", 0).unwrap();

    let mut stale = LockRecord::new("MUTEX:c-job", "t3", 5);
    stale.expires_at = Some(Utc::now() - Duration::seconds(1));
    plant(&provider, &stale);

    fs::write(provider.dir().join("junk.lock"), "garbage").unwrap();
    fs::write(provider.dir().join("notes.txt"), "ignored").unwrap();

    fs::write(provider.dir().join("sidecar.reap"), "").unwrap();

    let records = provider.list().unwrap();
    let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["MUTEX:a-job", "MUTEX:b-job"]);
}

#[test]
fn test_list_missing_directory_is_empty() {
    let provider = FileProvider::new("/nonexistent/cache-mutex/locks");
    assert!(provider.list().unwrap().is_empty());
}

#[test]
fn test_concurrent_claims_have_one_winner() {
    let (_temp_dir, provider) = file_provider();
    let key = key("race");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let provider = provider.clone();
            let key = key.clone();
            std::thread::spawn(move || provider.try_claim(&key, &format!("t{}", i), 0).unwrap())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn test_concurrent_claims_on_expired_record_have_one_winner() {
    let (_temp_dir, provider) = file_provider();

    for round in 0..100 {
        let name = format!("stale-{}", round);
        let mut stale = LockRecord::new(&format!("MUTEX:{}", name), "dead-process", 5);
        stale.expires_at = Some(Utc::now() - Duration::seconds(1));
        plant(&provider, &stale);

        let key = key(&name);
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let provider = provider.clone();
                let key = key.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    provider.try_claim(&key, &format!("t{}", i), 30).unwrap()
                })
            })
            .collect();

        let winners: Vec<_> = handles
            .into_iter()
            .enumerate()
            .filter_map(|(i, h)| h.join().unwrap().then(|| format!("t{}", i)))
            .collect();
        assert_eq!(winners.len(), 1, "round {} had winners {:?}", round, winners);
        assert_eq!(provider.read(&key).unwrap(), Some(winners[0].clone()));
    }
}
