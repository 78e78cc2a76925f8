//! hrlog store - SQLite-backed storage medium for the audit log
//!
//! Provides:
//! - A `kv` table behind the [`Storage`](hrlog_core::store::Storage) capability
//! - An optional byte quota that surfaces as `CapacityExceeded`
//! - Embedded, checksummed schema migrations

pub mod db;
pub mod errors;
pub mod kv;
pub mod migrations;

// Re-export key types
pub use errors::Result;
pub use kv::SqliteStorage;
