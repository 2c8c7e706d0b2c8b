// Migration framework: tables exist, re-application is a no-op

use rusqlite::Connection;

#[test]
fn test_schema_tables_created() {
    let mut conn = Connection::open_in_memory().unwrap();
    pagetrail_store::migrations::apply_migrations(&mut conn).unwrap();

    for table in ["pages", "collection_rows", "audit_log", "page_versions"] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[test]
fn test_migrations_recorded_once() {
    let mut conn = Connection::open_in_memory().unwrap();
    pagetrail_store::migrations::apply_migrations(&mut conn).unwrap();
    pagetrail_store::migrations::apply_migrations(&mut conn).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}
