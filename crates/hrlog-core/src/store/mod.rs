//! Bounded, persistent per-entity change logs
//!
//! Provides:
//! - The [`Storage`] capability over a capacity-constrained key-value medium
//! - [`MemoryStorage`], an in-memory medium with a byte quota and failure injection
//! - [`AuditLogStore`], the bounded log with tiered eviction under pressure

mod audit_log;
mod storage;

pub use audit_log::{AppendOutcome, AuditLogStore, EvictionTier, CAPACITY_PROBE_KEY};
pub use storage::{MemoryStorage, Storage};
