// Integration tests for the migration framework

use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = hrlog_store::migrations::apply_migrations(&mut conn);

    // Then: They succeed and create the expected tables
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());
    assert_eq!(get_table_names(&conn), vec!["kv", "schema_version"]);
}

#[test]
fn test_migrations_recorded_with_checksums() {
    let mut conn = setup_test_db();
    hrlog_store::migrations::apply_migrations(&mut conn).unwrap();
    hrlog_store::migrations::apply_migrations(&mut conn).unwrap();

    let rows: Vec<(String, String)> = {
        let mut stmt = conn
            .prepare("SELECT migration_id, checksum FROM schema_version ORDER BY id")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    };

    let migrations = hrlog_store::migrations::get_migrations();
    assert_eq!(rows.len(), migrations.len());
    for ((id, checksum), migration) in rows.iter().zip(migrations.iter()) {
        assert_eq!(id, migration.id);
        assert_eq!(
            checksum,
            &hrlog_store::migrations::compute_checksum(migration.sql)
        );
    }
}

#[test]
fn test_edited_migration_is_refused() {
    // Given: A database whose recorded checksum no longer matches
    let mut conn = setup_test_db();
    hrlog_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'tampered' WHERE migration_id = '001_kv_store'",
        [],
    )
    .unwrap();

    // When: Migrations are applied again
    let err = hrlog_store::migrations::apply_migrations(&mut conn).unwrap_err();

    // Then: The mismatch is reported
    assert_eq!(err.code(), "ERR_INVALID_STATE");
    assert!(err.message().contains("001_kv_store"));
}
