//! Log query operations
//!
//! Entries held only in memory are included alongside persisted ones.

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{ChangeEntry, ChangeKind};
use crate::store::{AuditLogStore, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Format version stamped on every export
pub const EXPORT_VERSION: &str = "1.0.0";

/// Most recent entries reported by [`statistics`]
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Aggregate view over every log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStatistics {
    pub total_logs: usize,
    pub unique_entities: usize,
    /// Entry count per kind, keyed by the wire name of the kind
    pub kind_counts: BTreeMap<String, usize>,
    pub recent_activity: Vec<ChangeEntry>,
    /// Timestamp of the newest entry
    pub last_updated: Option<DateTime<Utc>>,
}

/// Portable dump of one or all logs
///
/// `digest` is the lowercase hex SHA-256 of the compact JSON encoding of
/// `logs`, so a reader can detect tampering or truncation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogExport {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub total_logs: usize,
    pub digest: String,
    pub logs: Vec<ChangeEntry>,
}

impl LogExport {
    /// Whether `digest` matches `logs`
    ///
    /// # Errors
    ///
    /// `Serialization` if the logs cannot be encoded.
    pub fn verify(&self) -> Result<bool> {
        Ok(digest_of(&self.logs)? == self.digest)
    }
}

/// Every entry of every entity
///
/// # Errors
///
/// `Persistence` if the medium cannot enumerate its keys.
pub fn all_entries<S: Storage>(store: &AuditLogStore<S>) -> Result<Vec<ChangeEntry>> {
    let mut entries: Vec<ChangeEntry> = store
        .entity_ids()?
        .iter()
        .flat_map(|id| store.list(id))
        .collect();
    sort_newest_first(&mut entries);
    Ok(entries)
}

/// Entries of one kind
///
/// # Errors
///
/// As [`all_entries`].
pub fn entries_by_kind<S: Storage>(
    store: &AuditLogStore<S>,
    kind: ChangeKind,
) -> Result<Vec<ChangeEntry>> {
    Ok(all_entries(store)?
        .into_iter()
        .filter(|e| e.kind == kind)
        .collect())
}

/// Entries recorded by one actor
///
/// # Errors
///
/// As [`all_entries`].
pub fn entries_by_actor<S: Storage>(
    store: &AuditLogStore<S>,
    actor: &str,
) -> Result<Vec<ChangeEntry>> {
    Ok(all_entries(store)?
        .into_iter()
        .filter(|e| e.actor == actor)
        .collect())
}

/// Entries with `start <= timestamp <= end`
///
/// # Errors
///
/// `InvalidInput` if `start` is after `end`, otherwise as [`all_entries`].
pub fn entries_in_range<S: Storage>(
    store: &AuditLogStore<S>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ChangeEntry>> {
    if start > end {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("entries_in_range")
            .with_message(format!("range start {} is after end {}", start, end)));
    }
    Ok(all_entries(store)?
        .into_iter()
        .filter(|e| e.timestamp >= start && e.timestamp <= end)
        .collect())
}

/// Totals, per-kind counts and the latest activity
///
/// # Errors
///
/// As [`all_entries`].
pub fn statistics<S: Storage>(store: &AuditLogStore<S>) -> Result<LogStatistics> {
    let entries = all_entries(store)?;

    let mut kind_counts = BTreeMap::new();
    for entry in &entries {
        *kind_counts.entry(entry.kind.as_str().to_string()).or_insert(0) += 1;
    }
    let unique_entities = entries
        .iter()
        .map(|e| e.entity_id.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    Ok(LogStatistics {
        total_logs: entries.len(),
        unique_entities,
        kind_counts,
        last_updated: entries.first().map(|e| e.timestamp),
        recent_activity: entries.into_iter().take(RECENT_ACTIVITY_LIMIT).collect(),
    })
}

/// Export one entity's log, or every log when `entity_id` is `None`
///
/// # Errors
///
/// `Serialization` if the logs cannot be encoded for the digest, otherwise
/// as [`all_entries`].
pub fn export<S: Storage>(
    store: &AuditLogStore<S>,
    entity_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<LogExport> {
    let logs = match entity_id {
        Some(id) => store.list(id),
        None => all_entries(store)?,
    };
    let digest = digest_of(&logs)?;

    tracing::info!(
        entity_id = entity_id.unwrap_or("*"),
        entry_count = logs.len(),
        "audit log exported"
    );

    Ok(LogExport {
        export_date: now,
        version: EXPORT_VERSION.to_string(),
        total_logs: logs.len(),
        digest,
        logs,
    })
}

fn digest_of(logs: &[ChangeEntry]) -> Result<String> {
    let bytes = serde_json::to_vec(logs).map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op("export_digest")
            .with_message(e.to_string())
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn sort_newest_first(entries: &mut [ChangeEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
}
