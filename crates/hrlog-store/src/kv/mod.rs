//! SQLite key-value medium

mod sqlite_storage;

pub use sqlite_storage::SqliteStorage;
