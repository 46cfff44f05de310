// Integration tests for the migration framework

use rusqlite::Connection;
use vulnstore_core::ExErrorKind;

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
    let mut conn = setup_test_db();

    let result = vulnstore_store::migrations::apply_migrations(&mut conn);
    assert!(
        result.is_ok(),
        "Migrations should succeed: {:?}",
        result.err()
    );

    let tables = get_table_names(&conn);
    for expected_table in [
        "schema_version",
        "update_operation",
        "enrichment",
        "uo_enrich",
        "sqlite_sequence", // Auto-created by SQLite for AUTOINCREMENT columns
    ] {
        assert!(
            tables.contains(&expected_table.to_string()),
            "Missing table: {}",
            expected_table
        );
    }
}

#[test]
fn test_migrations_recorded_once() {
    let mut conn = setup_test_db();
    vulnstore_store::migrations::apply_migrations(&mut conn).unwrap();
    vulnstore_store::migrations::apply_migrations(&mut conn).unwrap();

    let applied = vulnstore_store::migrations::applied_migrations(&conn).unwrap();
    assert_eq!(applied, vec!["001_enrichment_schema".to_string()]);
}

#[test]
fn test_checksum_drift_detected() {
    let mut conn = setup_test_db();
    vulnstore_store::migrations::apply_migrations(&mut conn).unwrap();

    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_enrichment_schema'",
        [],
    )
    .unwrap();

    let err = vulnstore_store::migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.op(), Some("migration_checksum"));
}

#[test]
fn test_enrichment_uniqueness_is_per_updater() {
    let mut conn = setup_test_db();
    vulnstore_store::migrations::apply_migrations(&mut conn).unwrap();

    let insert = "INSERT INTO enrichment (hash_kind, hash, updater, tags, data)
                  VALUES ('sha256', X'00', ?1, '[]', X'01')";
    conn.execute(insert, ["a"]).unwrap();
    conn.execute(insert, ["b"]).unwrap();
    assert!(conn.execute(insert, ["a"]).is_err());
}

#[test]
fn test_tags_must_be_json_array() {
    let mut conn = setup_test_db();
    vulnstore_store::migrations::apply_migrations(&mut conn).unwrap();

    let result = conn.execute(
        "INSERT INTO enrichment (hash_kind, hash, updater, tags, data)
         VALUES ('sha256', X'00', 'u', '\"os:rhel\"', X'01')",
        [],
    );
    assert!(result.is_err());
}
