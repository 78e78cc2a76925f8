//! [`Storage`] over a SQLite `kv` table
//!
//! Usage is the byte length of every key plus its value, the same measure
//! [`MemoryStorage`](hrlog_core::store::MemoryStorage) uses, so a quota
//! behaves identically on both media.

#![allow(clippy::result_large_err)]

use crate::db;
use crate::errors::{backend_error, persist_error, Result};
use crate::migrations::apply_migrations;
use hrlog_core::errors::PersistError;
use hrlog_core::store::Storage;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

const USED_BYTES_SQL: &str =
    "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0) FROM kv";

/// SQLite-backed storage medium with an optional byte quota
pub struct SqliteStorage {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("quota_bytes", &self.quota_bytes)
            .finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Open (creating if needed) the database file at `path` and migrate it
    pub fn open<P: AsRef<Path>>(path: P, quota_bytes: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let conn = db::open(path)?;
        tracing::debug!(path = %path.display(), ?quota_bytes, "sqlite storage opened");
        Self::from_connection(conn, quota_bytes)
    }

    /// Fresh in-memory database, mostly for tests
    pub fn open_in_memory(quota_bytes: Option<usize>) -> Result<Self> {
        Self::from_connection(db::open_in_memory()?, quota_bytes)
    }

    /// Wrap an existing connection, applying pending migrations
    pub fn from_connection(mut conn: Connection, quota_bytes: Option<usize>) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self { conn, quota_bytes })
    }

    pub fn quota_bytes(&self) -> Option<usize> {
        self.quota_bytes
    }

    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.quota_bytes = quota_bytes;
    }

    /// Bytes currently used by keys and values
    pub fn used_bytes(&self) -> std::result::Result<usize, PersistError> {
        used_bytes(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn used_bytes(conn: &Connection) -> std::result::Result<usize, PersistError> {
    let used: i64 = conn
        .query_row(USED_BYTES_SQL, [], |row| row.get(0))
        .map_err(backend_error)?;
    Ok(usize::try_from(used).unwrap_or(0))
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, PersistError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(backend_error)
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), PersistError> {
        let bytes = key.len() + value.len();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| persist_error(e, key, bytes))?;

        if let Some(quota) = self.quota_bytes {
            let replaced: usize = tx
                .query_row(
                    "SELECT LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB)) FROM kv WHERE key = ?1",
                    [key],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
                .map_err(backend_error)?
                .map_or(0, |n| usize::try_from(n).unwrap_or(0));
            let used = used_bytes(&tx)?;
            if used.saturating_sub(replaced) + bytes > quota {
                tracing::debug!(key, bytes, used, quota, "write refused by quota");
                return Err(PersistError::CapacityExceeded {
                    key: key.to_string(),
                    bytes,
                });
            }
        }

        tx.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(|e| persist_error(e, key, bytes))?;

        tx.commit().map_err(|e| persist_error(e, key, bytes))
    }

    fn remove(&mut self, key: &str) -> std::result::Result<(), PersistError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(backend_error)?;
        Ok(())
    }

    fn keys(&self) -> std::result::Result<Vec<String>, PersistError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .map_err(backend_error)?;
        let keys = stmt
            .query_map([], |row| row.get(0))
            .map_err(backend_error)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(backend_error)?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut s = SqliteStorage::open_in_memory(None).unwrap();
        s.set("a", "1").unwrap();
        s.set("a", "2").unwrap();
        assert_eq!(s.get("a").unwrap().as_deref(), Some("2"));
        s.remove("a").unwrap();
        assert_eq!(s.get("a").unwrap(), None);
    }

    #[test]
    fn test_quota_measures_bytes() {
        // "é" is two bytes
        let mut s = SqliteStorage::open_in_memory(Some(5)).unwrap();
        s.set("k", "éé").unwrap();
        assert_eq!(s.used_bytes().unwrap(), 5);
        assert!(s.set("x", "").unwrap_err().is_capacity_exceeded());
    }
}
