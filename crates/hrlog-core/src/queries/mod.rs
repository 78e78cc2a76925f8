//! Read-only queries over every entity's audit log
//!
//! Results are ordered newest first by timestamp, ties broken by entry id,
//! so repeated queries over the same store return the same sequence.

pub mod log_queries;

pub use log_queries::{
    all_entries, entries_by_actor, entries_by_kind, entries_in_range, export, statistics,
    LogExport, LogStatistics, EXPORT_VERSION, RECENT_ACTIVITY_LIMIT,
};
