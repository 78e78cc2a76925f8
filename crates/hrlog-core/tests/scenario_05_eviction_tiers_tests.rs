#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Scenario 5: Tiered eviction under storage pressure
mod common;

use common::numbered_entry;
use hrlog_core::errors::PersistError;
use hrlog_core::store::{AppendOutcome, AuditLogStore, EvictionTier, MemoryStorage, Storage};

fn fill(store: &mut AuditLogStore<MemoryStorage>, entity_id: &str, count: i64) {
    for n in 0..count {
        store.append(entity_id, numbered_entry(entity_id, n)).unwrap();
    }
}

fn freeze_quota(store: &mut AuditLogStore<MemoryStorage>) {
    let used = store.storage().used_bytes();
    store.storage_mut().set_quota(Some(used));
}

#[test]
fn test_scenario_05_first_failure_runs_tier1() {
    // GIVEN a medium whose next write fails for lack of space
    let mut storage = MemoryStorage::new();
    storage.fail_next_sets(1);
    let mut store = AuditLogStore::new(storage);

    // WHEN an entry is appended
    let outcome = store.append("emp-1", numbered_entry("emp-1", 1)).unwrap();

    // THEN tier 1 ran and the retry persisted it
    assert_eq!(outcome, AppendOutcome::PersistedAfterEviction(EvictionTier::Tier1));
    let log = store.list("emp-1");
    assert!(log.len() <= 10);
    assert_eq!(log.len(), 1);
    assert!(store.memory_entries("emp-1").is_empty());
}

#[test]
fn test_scenario_05_tier1_trims_every_log() {
    // GIVEN two full logs and no spare room
    let mut store = AuditLogStore::new(MemoryStorage::new());
    fill(&mut store, "emp-1", 20);
    fill(&mut store, "emp-2", 20);
    freeze_quota(&mut store);

    // WHEN another entry is appended
    let outcome = store.append("emp-1", numbered_entry("emp-1", 99)).unwrap();

    // THEN every log was cut to 10 and the new entry leads its log
    assert_eq!(outcome, AppendOutcome::PersistedAfterEviction(EvictionTier::Tier1));
    let emp1 = store.list("emp-1");
    assert_eq!(emp1.len(), 10);
    assert_eq!(emp1[0].old_value, serde_json::json!(99));
    assert_eq!(store.list("emp-2").len(), 10);

    // AND the newest entries of the other log survived
    assert_eq!(store.list("emp-2")[0].old_value, serde_json::json!(19));
}

#[test]
fn test_scenario_05_tier2_purges_large_foreign_keys() {
    // GIVEN a large unrelated key, a small one, and a short log
    let mut storage = MemoryStorage::new();
    storage.set("photo-cache", &"x".repeat(20 * 1024)).unwrap();
    storage.set("prefs", "{\"theme\":\"dark\"}").unwrap();
    let mut store = AuditLogStore::new(storage);
    fill(&mut store, "emp-1", 3);
    freeze_quota(&mut store);

    // WHEN an entry is appended
    let outcome = store.append("emp-1", numbered_entry("emp-1", 50)).unwrap();

    // THEN the large key was sacrificed and the write went through
    assert_eq!(outcome, AppendOutcome::PersistedAfterEviction(EvictionTier::Tier2));
    assert!(store.storage().get("photo-cache").unwrap().is_none());
    assert!(store.storage().get("prefs").unwrap().is_some());

    let log = store.list("emp-1");
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].old_value, serde_json::json!(50));
}

#[test]
fn test_scenario_05_tier2_trims_target_to_five() {
    let mut storage = MemoryStorage::new();
    storage.set("photo-cache", &"x".repeat(11 * 1024)).unwrap();
    let mut store = AuditLogStore::new(storage);
    fill(&mut store, "emp-1", 10);

    // once the cache is purged only a log shorter than ten entries fits
    let used_without_cache = store.storage().used_bytes() - ("photo-cache".len() + 11 * 1024);
    store.storage_mut().set_quota(Some(used_without_cache));

    let outcome = store.append("emp-1", numbered_entry("emp-1", 77)).unwrap();

    assert_eq!(outcome, AppendOutcome::PersistedAfterEviction(EvictionTier::Tier2));
    assert_eq!(store.list("emp-1").len(), 5);
}

#[test]
fn test_scenario_05_memory_only_when_nothing_fits() {
    // GIVEN a medium with no usable space
    let mut store = AuditLogStore::new(MemoryStorage::with_quota(16));

    // WHEN entries are appended
    let e1 = numbered_entry("emp-1", 1);
    let e2 = numbered_entry("emp-1", 2);
    assert_eq!(store.append("emp-1", e1.clone()).unwrap(), AppendOutcome::MemoryOnly);
    assert_eq!(store.append("emp-1", e2.clone()).unwrap(), AppendOutcome::MemoryOnly);

    // THEN they are still listed, newest first
    assert_eq!(store.list("emp-1"), vec![e2, e1]);

    // AND a fresh store over the same medium sees nothing
    let medium = store.into_storage();
    assert!(AuditLogStore::new(medium).list("emp-1").is_empty());
}

#[test]
fn test_scenario_05_memory_entries_merge_with_persisted() {
    let mut store = AuditLogStore::new(MemoryStorage::new());
    store.append("emp-1", numbered_entry("emp-1", 1)).unwrap();

    store.storage_mut().set_quota(Some(0));
    store.append("emp-1", numbered_entry("emp-1", 2)).unwrap();
    store.storage_mut().set_quota(None);
    store.append("emp-1", numbered_entry("emp-1", 3)).unwrap();

    let order: Vec<_> = store
        .list("emp-1")
        .into_iter()
        .map(|e| e.old_value)
        .collect();
    assert_eq!(
        order,
        vec![serde_json::json!(3), serde_json::json!(2), serde_json::json!(1)]
    );
}

#[test]
fn test_scenario_05_memory_entry_keeps_its_place_at_equal_timestamps() {
    // GIVEN a persisted entry and a medium with little spare room
    let mut store = AuditLogStore::new(MemoryStorage::new());
    store.append("emp-1", numbered_entry("emp-1", 1)).unwrap();
    let quota = store.storage().used_bytes() + 600;
    store.storage_mut().set_quota(Some(quota));

    // WHEN an oversized entry falls back to memory and a small one with the
    // same timestamp is persisted right after it
    let mut oversized = numbered_entry("emp-1", 10);
    oversized.description = "x".repeat(2000);
    let small = numbered_entry("emp-1", 10);
    assert_eq!(store.append("emp-1", oversized.clone()).unwrap(), AppendOutcome::MemoryOnly);
    assert_eq!(store.append("emp-1", small.clone()).unwrap(), AppendOutcome::Persisted);

    // THEN the log lists them in the order they were appended
    let ids: Vec<_> = store.list("emp-1").into_iter().map(|e| e.id).collect();
    assert_eq!(ids[0], small.id);
    assert_eq!(ids[1], oversized.id);
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_scenario_05_transient_read_failure_does_not_erase_history() {
    // GIVEN an entity with fifteen persisted entries
    let mut store = AuditLogStore::new(MemoryStorage::new());
    fill(&mut store, "emp-1", 15);

    // WHEN the medium fails one read during the next append
    store.storage_mut().fail_next_gets(1);
    let err = store
        .append("emp-1", numbered_entry("emp-1", 15))
        .unwrap_err();

    // THEN the failure is reported and nothing was lost
    assert!(matches!(err, PersistError::Backend { .. }));
    assert_eq!(store.list("emp-1").len(), 16);

    // AND the following append persists on top of the full history
    store.append("emp-1", numbered_entry("emp-1", 16)).unwrap();
    let persisted = AuditLogStore::new(store.into_storage()).list("emp-1");
    assert_eq!(persisted.len(), 16);
    assert_eq!(persisted[0].old_value, serde_json::json!(16));
}

/// Medium that rejects every write with a backend failure
struct BrokenStorage;

impl Storage for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistError> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PersistError> {
        Err(PersistError::Backend {
            message: "disk unplugged".to_string(),
        })
    }

    fn remove(&mut self, _key: &str) -> Result<(), PersistError> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistError> {
        Ok(Vec::new())
    }
}

#[test]
fn test_scenario_05_backend_failure_is_reported_and_kept_in_memory() {
    let mut store = AuditLogStore::new(BrokenStorage);
    let entry = numbered_entry("emp-1", 1);

    let err = store.append("emp-1", entry.clone()).unwrap_err();
    assert!(!err.is_capacity_exceeded());
    assert_eq!(store.list("emp-1"), vec![entry]);
}
