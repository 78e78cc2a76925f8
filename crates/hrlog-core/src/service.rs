//! Edit-session orchestration for the audit log
//!
//! The service drives one record editor at a time:
//!
//! ```text
//! View --enter_edit_session--> Edit --commit_edits--> (Saved) --> View
//!                                   --cancel_edit---> (Cancelled) --> View
//! ```
//!
//! While editing, field edits pass through a [`DebounceCoalescer`] and are
//! committed by [`tick`](AuditLogService::tick) once their window elapses.
//! Saving diffs the whole record and appends one entry per changed field.
//!
//! Persistence is fire-and-forget: a failing store never fails an edit.
//! Failures are reported through tracing and the entries stay visible in
//! the store's in-memory working set.

use crate::config::AuditLogConfig;
use crate::debounce::{CoalescedEdit, DebounceCoalescer};
use crate::diff::{compute_diff_with, describe};
use crate::errors::ExError;
use crate::model::{ChangeEntry, ChangeKind, FieldChange, FieldValue, RecordSnapshot};
use crate::scheduler::Clock;
use crate::store::{AuditLogStore, Storage};
use crate::{log_op_end, log_op_error, log_op_start};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hrlog_core_types::SessionId;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;

/// Field holding the creation timestamp used for the synthetic `Created` entry
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Editor mode of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    View,
    Edit,
}

/// How the most recent edit session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Saved,
    Cancelled,
    /// Replaced by a new session before it was saved or cancelled
    Abandoned,
}

#[derive(Debug)]
struct EditSession {
    id: SessionId,
    entity_id: String,
    original: RecordSnapshot,
    coalescer: DebounceCoalescer,
}

/// Audit log service bound to a storage medium and a clock
#[derive(Debug)]
pub struct AuditLogService<S, C> {
    store: AuditLogStore<S>,
    clock: C,
    session: Option<EditSession>,
    last_end: Option<SessionEnd>,
    baselines: HashMap<String, RecordSnapshot>,
}

impl<S: Storage, C: Clock> AuditLogService<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self::with_config(storage, clock, AuditLogConfig::default())
    }

    pub fn with_config(storage: S, clock: C, config: AuditLogConfig) -> Self {
        Self {
            store: AuditLogStore::with_config(storage, config),
            clock,
            session: None,
            last_end: None,
            baselines: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AuditLogConfig {
        self.store.config()
    }

    pub fn store(&self) -> &AuditLogStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AuditLogStore<S> {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn mode(&self) -> EditMode {
        if self.session.is_some() {
            EditMode::Edit
        } else {
            EditMode::View
        }
    }

    pub fn last_session_end(&self) -> Option<SessionEnd> {
        self.last_end
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    /// Entity being edited, if any
    pub fn editing_entity(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.entity_id.as_str())
    }

    /// Fields with an edit waiting for its debounce window
    pub fn pending_edits(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.coalescer.pending_count())
    }

    /// When the next pending edit becomes due
    pub fn next_due(&self) -> Option<i64> {
        self.session.as_ref().and_then(|s| s.coalescer.next_due())
    }

    /// Last committed snapshot of an entity
    pub fn baseline(&self, entity_id: &str) -> Option<&RecordSnapshot> {
        self.baselines.get(entity_id)
    }

    /// Open an edit session on `entity_id` with `snapshot` as its original
    ///
    /// An already open session is torn down first and its pending edits are
    /// dropped. A `ModeEntered` entry is appended on a best-effort basis.
    pub fn enter_edit_session(&mut self, entity_id: &str, snapshot: RecordSnapshot) -> SessionId {
        if let Some(previous) = self.session.take() {
            tracing::warn!(
                session_id = %previous.id,
                entity_id = %previous.entity_id,
                dropped_edits = previous.coalescer.pending_count(),
                "edit session replaced before it ended"
            );
            self.last_end = Some(SessionEnd::Abandoned);
        }

        let id = SessionId::new();
        tracing::info!(session_id = %id, entity_id, "edit session opened");

        self.session = Some(EditSession {
            id: id.clone(),
            entity_id: entity_id.to_string(),
            original: snapshot,
            coalescer: DebounceCoalescer::new(self.config().debounce_ms),
        });

        let change = FieldChange {
            kind: ChangeKind::ModeEntered,
            field: "mode".to_string(),
            old_value: json!("view"),
            new_value: json!("edit"),
        };
        let now = self.clock.now();
        self.record(entity_id, &id, change, now);
        id
    }

    /// Buffer an edit to one field of the open session
    ///
    /// Returns false, and records nothing, when no session is open.
    pub fn record_field_change(
        &mut self,
        field: &str,
        old_value: FieldValue,
        new_value: FieldValue,
    ) -> bool {
        let now = self.clock.now_millis();
        match self.session.as_mut() {
            Some(session) => {
                session.coalescer.schedule(field, old_value, new_value, now);
                tracing::debug!(session_id = %session.id, field, "field edit buffered");
                true
            }
            None => {
                tracing::warn!(field, "field edit outside an edit session ignored");
                false
            }
        }
    }

    /// Commit every buffered edit whose debounce window has elapsed
    ///
    /// Returns the entries recorded. An edit whose final value equals its
    /// first old value records nothing.
    pub fn tick(&mut self) -> Vec<ChangeEntry> {
        let now = self.clock.now_millis();
        let (session_id, entity_id, due) = match self.session.as_mut() {
            Some(session) => {
                let mut due = Vec::new();
                session.coalescer.fire_due(now, |edit| due.push(edit));
                (session.id.clone(), session.entity_id.clone(), due)
            }
            None => return Vec::new(),
        };

        let changes: Vec<FieldChange> = due
            .into_iter()
            .flat_map(|edit| self.coalesced_changes(edit))
            .collect();
        let timestamp = self.clock.now();
        changes
            .into_iter()
            .map(|change| self.record(&entity_id, &session_id, change, timestamp))
            .collect()
    }

    /// Save the open session: diff `original` against `edited` and record
    /// one entry per changed field
    ///
    /// Pending debounced edits are dropped, the service returns to view
    /// mode and `edited` becomes the entity's baseline. Returns the entries
    /// recorded; without an open session nothing happens.
    pub fn commit_edits(
        &mut self,
        original: &RecordSnapshot,
        edited: &RecordSnapshot,
    ) -> Vec<ChangeEntry> {
        let Some(mut session) = self.session.take() else {
            tracing::warn!("commit without an edit session ignored");
            return Vec::new();
        };

        let start = Instant::now();
        log_op_start!(
            "commit_edits",
            session_id = %session.id,
            entity_id = %session.entity_id
        );

        let dropped = session.coalescer.cancel_all();
        if dropped > 0 {
            tracing::debug!(session_id = %session.id, dropped, "pending edits superseded by save");
        }

        let timestamp = self.clock.now();
        let changes = compute_diff_with(original, edited, &self.config().denylist);
        let entries: Vec<ChangeEntry> = changes
            .into_iter()
            .map(|change| self.record(&session.entity_id, &session.id, change, timestamp))
            .collect();

        self.baselines
            .insert(session.entity_id.clone(), edited.clone());
        self.last_end = Some(SessionEnd::Saved);

        log_op_end!(
            "commit_edits",
            duration_ms = start.elapsed().as_millis() as u64,
            session_id = %session.id,
            entity_id = %session.entity_id,
            entry_count = entries.len()
        );
        entries
    }

    /// Discard the open session without recording anything
    ///
    /// Returns false when no session was open.
    pub fn cancel_edit(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                let dropped = session.coalescer.cancel_all();
                tracing::info!(
                    session_id = %session.id,
                    entity_id = %session.entity_id,
                    dropped,
                    "edit session cancelled"
                );
                self.last_end = Some(SessionEnd::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Original snapshot of the open session
    pub fn session_original(&self) -> Option<&RecordSnapshot> {
        self.session.as_ref().map(|s| &s.original)
    }

    /// The entity's history for display, newest first
    ///
    /// An entity with no history but a parsable `createdAt` in `record`
    /// gets a single synthetic `Created` entry. That entry is never
    /// persisted.
    pub fn load_log(&self, entity_id: &str, record: Option<&RecordSnapshot>) -> Vec<ChangeEntry> {
        let entries = self.store.list(entity_id);
        if !entries.is_empty() {
            return entries;
        }

        let Some(created_at) = record
            .and_then(|r| r.get(CREATED_AT_FIELD))
            .and_then(parse_created_at)
        else {
            return entries;
        };

        let change = FieldChange {
            kind: ChangeKind::Created,
            field: CREATED_AT_FIELD.to_string(),
            old_value: serde_json::Value::Null,
            new_value: json!(created_at.to_rfc3339()),
        };
        let description = describe(&change);
        vec![ChangeEntry::stamp(
            change,
            entity_id,
            self.config().actor.clone(),
            description,
            created_at,
        )]
    }

    /// Forget an entity's history; returns false if the medium failed
    pub fn clear(&mut self, entity_id: &str) -> bool {
        let start = Instant::now();
        match self.store.clear(entity_id) {
            Ok(()) => true,
            Err(e) => {
                let err = ExError::from(e).with_entity_id(entity_id);
                log_op_error!(
                    "audit_clear",
                    err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_id = entity_id
                );
                false
            }
        }
    }

    /// Forget every entity's history, returning how many logs were removed
    pub fn clear_all(&mut self) -> usize {
        let start = Instant::now();
        match self.store.clear_all() {
            Ok(removed) => removed,
            Err(e) => {
                log_op_error!(
                    "audit_clear_all",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64
                );
                0
            }
        }
    }

    fn coalesced_changes(&self, edit: CoalescedEdit) -> Vec<FieldChange> {
        let before = RecordSnapshot::single(edit.field.clone(), edit.old_value);
        let after = RecordSnapshot::single(edit.field, edit.new_value);
        compute_diff_with(&before, &after, &self.config().denylist)
    }

    /// Describe, stamp and append one change; the entry is returned even
    /// if it could not be persisted
    fn record(
        &mut self,
        entity_id: &str,
        session_id: &SessionId,
        change: FieldChange,
        timestamp: DateTime<Utc>,
    ) -> ChangeEntry {
        let description = describe(&change);
        let entry = ChangeEntry::stamp(
            change,
            entity_id,
            self.config().actor.clone(),
            description,
            timestamp,
        );
        if let Err(e) = self.store.append(entity_id, entry.clone()) {
            let err = ExError::from(e)
                .with_entity_id(entity_id)
                .with_field(entry.field.clone())
                .with_session_id(session_id.clone());
            tracing::warn!(
                entity_id,
                entry_id = %entry.id,
                session_id = %session_id,
                err.code = err.code(),
                error = %err,
                "entry kept in memory only"
            );
        }
        entry
    }
}

/// Parse a creation timestamp: RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`
/// taken as UTC, or a bare `YYYY-MM-DD` taken as UTC midnight
pub fn parse_created_at(value: &FieldValue) -> Option<DateTime<Utc>> {
    let text = value.as_display_text()?;
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
