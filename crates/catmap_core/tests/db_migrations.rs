use catmap_core::db::migrations::latest_version;
use catmap_core::db::{open_db, open_db_in_memory, open_db_read_only, DbError};
use catmap_core::repo::taxonomy_repo::{
    load_taxonomy_from_path, SqliteTaxonomyRepository, TaxonomyRepository,
};
use catmap_core::TargetCategory;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "taxonomy_categories");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taxonomy.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "taxonomy_categories");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_only_open_rejects_unmigrated_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.db");
    drop(Connection::open(&path).unwrap());

    let err = open_db_read_only(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::OutdatedSchemaVersion { db_version: 0, .. }
    ));
}

#[test]
fn taxonomy_written_through_file_is_loaded_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taxonomy.db");

    let conn = open_db(&path).unwrap();
    SqliteTaxonomyRepository::new(&conn)
        .replace_all(&[
            TargetCategory::from_path_str("50001", "주방용품>냄비>양수냄비"),
            TargetCategory::from_path_str("50002", "주방용품>냄비>편수냄비"),
        ])
        .unwrap();
    drop(conn);

    let taxonomy = load_taxonomy_from_path(&path);
    assert_eq!(taxonomy.len(), 2);
    assert_eq!(taxonomy.categories()[0].leaf(), "양수냄비");
    assert!(taxonomy.contains(&"50002".into()));
}

#[test]
fn missing_taxonomy_file_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let taxonomy = load_taxonomy_from_path(dir.path().join("absent.db"));
    assert!(taxonomy.is_empty());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
