//! Error handling for hrlog-store
//!
//! Wraps hrlog-core ExError with store-specific helpers, and maps SQLite
//! failures onto the [`PersistError`] contract of the storage capability.

use hrlog_core::errors::{ExError, ExErrorKind, PersistError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidState)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Map a SQLite failure during a write of `bytes` under `key`
///
/// A full database file is the capacity signal; anything else is a
/// backend failure.
pub fn persist_error(err: rusqlite::Error, key: &str, bytes: usize) -> PersistError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::DiskFull => {
            PersistError::CapacityExceeded {
                key: key.to_string(),
                bytes,
            }
        }
        _ => backend_error(err),
    }
}

/// Map a SQLite failure that cannot mean "no room"
pub fn backend_error(err: rusqlite::Error) -> PersistError {
    PersistError::Backend {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_full_is_capacity() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
            None,
        );
        assert!(persist_error(err, "k", 3).is_capacity_exceeded());
    }

    #[test]
    fn test_other_failures_are_backend() {
        let err = persist_error(rusqlite::Error::InvalidQuery, "k", 3);
        assert!(!err.is_capacity_exceeded());
    }

    #[test]
    fn test_io_error_kind() {
        let err = io_error(
            "open_db",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), ExErrorKind::Io);
        assert_eq!(err.op(), Some("open_db"));
    }
}
