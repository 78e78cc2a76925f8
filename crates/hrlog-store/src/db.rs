//! SQLite connection handling for the key-value medium
//!
//! Every file-backed connection runs in WAL mode and waits on locks held by
//! another writer instead of failing straight away.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, io_error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// How long a write waits for a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database file at `path`, creating it and its parent directories
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error("create_db_dir", e))?;
    }
    let conn = Connection::open(path).map_err(from_rusqlite)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT).map_err(from_rusqlite)?;
    // journal_mode answers with a row, so it cannot go through execute()
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)
}
