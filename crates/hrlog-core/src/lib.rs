//! hrlog core - change auditing for HR records
//!
//! This crate provides:
//! - Record snapshots and the field-level diff engine
//! - Human-readable descriptions of every change
//! - Debounced coalescing of in-progress field edits
//! - A bounded per-entity audit log with tiered eviction under storage pressure
//! - The edit-session service tying them together
//! - Read-only queries, statistics and digest-stamped export

pub mod config;
pub mod debounce;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod queries;
pub mod scheduler;
pub mod service;
pub mod store;

#[doc(hidden)]
pub use hrlog_core_types::schema as log_schema;

// Re-export commonly used types
pub use config::AuditLogConfig;
pub use debounce::{CoalescedEdit, DebounceCoalescer};
pub use errors::{ExError, ExErrorKind, PersistError, Result};
pub use model::{ChangeEntry, ChangeKind, FieldChange, FieldValue, RecordSnapshot};
pub use scheduler::{Clock, ManualClock, SystemClock};
pub use service::{AuditLogService, EditMode, SessionEnd};
pub use store::{AppendOutcome, AuditLogStore, EvictionTier, MemoryStorage, Storage};
