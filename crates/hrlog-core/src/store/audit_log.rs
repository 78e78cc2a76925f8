//! Bounded per-entity change logs over a [`Storage`] medium
//!
//! Each entity's history is one JSON array of [`ChangeEntry`] under
//! `<prefix><entity_id>`, newest first. When the medium is full the write
//! path degrades in steps:
//!
//! 1. trim every persisted log to `tier1_entries` and retry
//! 2. purge unrelated keys above `large_key_threshold_bytes`, trim the
//!    target to `tier2_entries` and retry
//! 3. keep the entry in a per-entity in-memory working set
//!
//! Tier 2 deletes data that does not belong to the audit log. That loss is
//! accepted to keep recording changes.

use crate::config::AuditLogConfig;
use crate::errors::PersistError;
use crate::model::ChangeEntry;
use crate::store::storage::Storage;
use crate::{log_op_degraded, log_op_end, log_op_error, log_op_start};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Key written and removed again to test for free space
///
/// Lives outside every valid log namespace; see
/// [`AuditLogConfig::validate`].
pub const CAPACITY_PROBE_KEY: &str = "__hrlog_capacity_probe__";
const PROBE_VALUE: &str = "probe";

/// Eviction step that made room for a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionTier {
    /// Every log trimmed to the tier-1 bound
    Tier1,
    /// Large foreign keys purged and the target trimmed to the tier-2 bound
    Tier2,
}

impl EvictionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionTier::Tier1 => "tier1",
            EvictionTier::Tier2 => "tier2",
        }
    }
}

/// Where an appended entry ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Persisted,
    PersistedAfterEviction(EvictionTier),
    /// Not persisted; visible through `list` for the process lifetime
    MemoryOnly,
}

/// An entry tagged with the order in which it was appended
#[derive(Debug, Clone)]
struct Sequenced {
    seq: u64,
    entry: ChangeEntry,
}

/// Bounded audit log over a capacity-constrained medium
///
/// Writers sharing the medium are not coordinated: concurrent appends to
/// the same entity resolve as last write wins.
#[derive(Debug)]
pub struct AuditLogStore<S> {
    storage: S,
    config: AuditLogConfig,
    memory: HashMap<String, VecDeque<Sequenced>>,
    /// Append sequence of the entries this store persisted, per entity and
    /// entry id. Entries found on the medium without one predate the store.
    persisted_seq: HashMap<String, HashMap<String, u64>>,
    next_seq: u64,
}

impl<S: Storage> AuditLogStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, AuditLogConfig::default())
    }

    pub fn with_config(storage: S, config: AuditLogConfig) -> Self {
        Self {
            storage,
            config,
            memory: HashMap::new(),
            persisted_seq: HashMap::new(),
            next_seq: 1,
        }
    }

    pub fn config(&self) -> &AuditLogConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Backing-store key holding an entity's log
    pub fn key_for(&self, entity_id: &str) -> String {
        format!("{}{}", self.config.key_prefix, entity_id)
    }

    /// Prepend `entry` to the entity's log
    ///
    /// # Errors
    ///
    /// Any non-capacity failure of the medium, including a failed read of
    /// the existing log. The persisted log is left untouched in that case
    /// and the entry is kept in the in-memory working set, so it stays
    /// visible through `list`. Capacity failures never surface; they end
    /// in `MemoryOnly`.
    pub fn append(
        &mut self,
        entity_id: &str,
        entry: ChangeEntry,
    ) -> Result<AppendOutcome, PersistError> {
        let start = Instant::now();
        log_op_start!("audit_append", entity_id = entity_id);

        let seq = self.next_seq;
        self.next_seq += 1;

        let key = self.key_for(entity_id);
        let mut log = match self.read_persisted(entity_id) {
            Ok(log) => log,
            Err(e) => {
                log_op_error!(
                    "audit_append",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id
                );
                self.remember(entity_id, seq, entry);
                return Err(e);
            }
        };
        log.insert(0, entry);

        if self.probe() {
            match self.write_log(&key, &log, self.config.max_entries) {
                Ok(()) => {
                    self.note_persisted(entity_id, seq, &log, self.config.max_entries);
                    log_op_end!(
                        "audit_append",
                        duration_ms = start.elapsed().as_millis() as u64,
                        entity_id = entity_id
                    );
                    return Ok(AppendOutcome::Persisted);
                }
                Err(e) if e.is_capacity_exceeded() => {}
                Err(e) => {
                    log_op_error!(
                        "audit_append",
                        e.clone(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        entity_id = entity_id
                    );
                    self.remember(entity_id, seq, log.remove(0));
                    return Err(e);
                }
            }
        }

        log_op_degraded!("audit_append", tier = "tier1", entity_id = entity_id);
        let trimmed = self.trim_all(self.config.tier1_entries);
        tracing::debug!(entity_id, logs_trimmed = trimmed, "tier-1 eviction done");
        match self.write_log(&key, &log, self.config.tier1_entries) {
            Ok(()) => {
                self.note_persisted(entity_id, seq, &log, self.config.tier1_entries);
                log_op_end!(
                    "audit_append",
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id,
                    tier = "tier1"
                );
                return Ok(AppendOutcome::PersistedAfterEviction(EvictionTier::Tier1));
            }
            Err(e) if e.is_capacity_exceeded() => {}
            Err(e) => {
                log_op_error!(
                    "audit_append",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id,
                    tier = "tier1"
                );
                self.remember(entity_id, seq, log.remove(0));
                return Err(e);
            }
        }

        log_op_degraded!("audit_append", tier = "tier2", entity_id = entity_id);
        let purged = self.purge_large_foreign_keys();
        tracing::debug!(entity_id, keys_purged = purged, "tier-2 eviction done");
        match self.write_log(&key, &log, self.config.tier2_entries) {
            Ok(()) => {
                self.note_persisted(entity_id, seq, &log, self.config.tier2_entries);
                log_op_end!(
                    "audit_append",
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id,
                    tier = "tier2"
                );
                Ok(AppendOutcome::PersistedAfterEviction(EvictionTier::Tier2))
            }
            Err(e) if e.is_capacity_exceeded() => {
                log_op_degraded!("audit_append", tier = "memory", entity_id = entity_id);
                self.remember(entity_id, seq, log.remove(0));
                log_op_end!(
                    "audit_append",
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id,
                    tier = "memory"
                );
                Ok(AppendOutcome::MemoryOnly)
            }
            Err(e) => {
                log_op_error!(
                    "audit_append",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id,
                    tier = "tier2"
                );
                self.remember(entity_id, seq, log.remove(0));
                Err(e)
            }
        }
    }

    /// The entity's history, newest first, at most `max_entries` long
    ///
    /// Merges persisted entries with the in-memory working set in append
    /// order. Unreadable logs read as empty.
    pub fn list(&self, entity_id: &str) -> Vec<ChangeEntry> {
        let persisted = match self.read_persisted(entity_id) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "audit log unreadable, listing memory only");
                Vec::new()
            }
        };
        let mut merged = match self.memory.get(entity_id) {
            Some(memory) if !memory.is_empty() => {
                let seqs = self.persisted_seq.get(entity_id);
                let persisted = persisted
                    .into_iter()
                    .map(|entry| Sequenced {
                        seq: seqs.and_then(|s| s.get(&entry.id)).copied().unwrap_or(0),
                        entry,
                    })
                    .collect();
                merge_newest_first(memory.iter().cloned().collect(), persisted)
            }
            _ => persisted,
        };
        merged.truncate(self.config.max_entries);
        merged
    }

    /// Entries held only in memory for an entity, newest first
    pub fn memory_entries(&self, entity_id: &str) -> Vec<ChangeEntry> {
        self.memory
            .get(entity_id)
            .map(|m| m.iter().map(|s| s.entry.clone()).collect())
            .unwrap_or_default()
    }

    /// Forget an entity's history, persisted and in memory
    pub fn clear(&mut self, entity_id: &str) -> Result<(), PersistError> {
        self.memory.remove(entity_id);
        self.persisted_seq.remove(entity_id);
        let key = self.key_for(entity_id);
        self.storage.remove(&key)?;
        tracing::info!(entity_id, "audit log cleared");
        Ok(())
    }

    /// Forget every entity's history, returning how many persisted logs were removed
    ///
    /// Keys outside the log prefix are left alone.
    pub fn clear_all(&mut self) -> Result<usize, PersistError> {
        self.memory.clear();
        self.persisted_seq.clear();
        let keys = self.log_keys()?;
        for key in &keys {
            self.storage.remove(key)?;
        }
        tracing::info!(logs_removed = keys.len(), "all audit logs cleared");
        Ok(keys.len())
    }

    /// Entities with a persisted or in-memory log, sorted
    pub fn entity_ids(&self) -> Result<Vec<String>, PersistError> {
        let prefix_len = self.config.key_prefix.len();
        let mut ids: Vec<String> = self
            .log_keys()?
            .into_iter()
            .map(|key| key[prefix_len..].to_string())
            .chain(
                self.memory
                    .iter()
                    .filter(|(_, m)| !m.is_empty())
                    .map(|(id, _)| id.clone()),
            )
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn log_keys(&self) -> Result<Vec<String>, PersistError> {
        Ok(self
            .storage
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(&self.config.key_prefix) && key != CAPACITY_PROBE_KEY)
            .collect())
    }

    /// Small write-then-remove to see whether the medium has any room left
    fn probe(&mut self) -> bool {
        match self.storage.set(CAPACITY_PROBE_KEY, PROBE_VALUE) {
            Ok(()) => {
                if let Err(e) = self.storage.remove(CAPACITY_PROBE_KEY) {
                    tracing::warn!(error = %e, "failed to remove capacity probe key");
                }
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "capacity probe failed");
                false
            }
        }
    }

    fn read_persisted(&self, entity_id: &str) -> Result<Vec<ChangeEntry>, PersistError> {
        let key = self.key_for(entity_id);
        self.read_key(&key)
    }

    /// A missing or corrupt log reads as empty; a failing medium is an error
    fn read_key(&self, key: &str) -> Result<Vec<ChangeEntry>, PersistError> {
        let Some(text) = self.storage.get(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<ChangeEntry>>(&text) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(key, error = %e, "audit log corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write_log(
        &mut self,
        key: &str,
        log: &[ChangeEntry],
        limit: usize,
    ) -> Result<(), PersistError> {
        let kept = &log[..log.len().min(limit)];
        let text = serde_json::to_string(kept)?;
        self.storage.set(key, &text)
    }

    /// Trim every persisted log to `limit`, returning how many were shortened
    ///
    /// A log that cannot be read is left as it is.
    fn trim_all(&mut self, limit: usize) -> usize {
        let keys = match self.log_keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list audit logs for eviction");
                return 0;
            }
        };

        let mut trimmed = 0;
        for key in keys {
            let log = match self.read_key(&key) {
                Ok(log) => log,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping unreadable log during eviction");
                    continue;
                }
            };
            if log.len() <= limit {
                continue;
            }
            match self.write_log(&key, &log, limit) {
                Ok(()) => trimmed += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "eviction trim failed"),
            }
        }
        trimmed
    }

    /// Remove keys outside the log prefix whose size exceeds the threshold
    fn purge_large_foreign_keys(&mut self) -> usize {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list keys for purge");
                return 0;
            }
        };

        let mut purged = 0;
        for key in keys {
            if key.starts_with(&self.config.key_prefix) {
                continue;
            }
            let size = match self.storage.get(&key) {
                Ok(Some(value)) => key.len() + value.len(),
                _ => continue,
            };
            if size <= self.config.large_key_threshold_bytes {
                continue;
            }
            match self.storage.remove(&key) {
                Ok(()) => {
                    tracing::warn!(key = %key, bytes = size, "purged large key to free space");
                    purged += 1;
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "purge failed"),
            }
        }
        purged
    }

    /// Record the sequence of the entry just written at the head of `log`,
    /// forgetting entries that fell off the written prefix
    fn note_persisted(&mut self, entity_id: &str, seq: u64, log: &[ChangeEntry], limit: usize) {
        let kept = &log[..log.len().min(limit)];
        let seqs = self.persisted_seq.entry(entity_id.to_string()).or_default();
        if let Some(head) = kept.first() {
            seqs.insert(head.id.clone(), seq);
        }
        seqs.retain(|id, _| kept.iter().any(|e| &e.id == id));
    }

    fn remember(&mut self, entity_id: &str, seq: u64, entry: ChangeEntry) {
        let cap = self.config.memory_entries;
        let memory = self.memory.entry(entity_id.to_string()).or_default();
        memory.push_front(Sequenced { seq, entry });
        memory.truncate(cap);
    }
}

/// Merge two newest-first sequences by append order
fn merge_newest_first(memory: Vec<Sequenced>, persisted: Vec<Sequenced>) -> Vec<ChangeEntry> {
    let mut memory = memory.into_iter().peekable();
    let mut persisted = persisted.into_iter().peekable();
    let mut out = Vec::new();

    loop {
        let take_memory = match (memory.peek(), persisted.peek()) {
            (Some(a), Some(b)) => a.seq > b.seq,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_memory {
            memory.next()
        } else {
            persisted.next()
        };
        if let Some(s) = next {
            out.push(s.entry);
        }
    }
    out
}
