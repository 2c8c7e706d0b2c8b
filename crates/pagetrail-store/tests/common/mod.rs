use pagetrail_store::repo::{PageRecord, PageRepo};
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

/// Temp database with migrations applied
#[allow(dead_code)]
pub fn setup_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let conn = pagetrail_store::db::open_ready(temp_dir.path().join("test.db")).unwrap();
    (temp_dir, conn)
}

#[allow(dead_code)]
pub fn obj(v: Value) -> Map<String, Value> {
    v.as_object().unwrap().clone()
}

/// Insert a page owned by `owner` with a title setting
#[allow(dead_code)]
pub fn seed_page(conn: &Connection, id: &str, owner: &str) {
    PageRepo::create_page(
        conn,
        &PageRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            settings: obj(json!({"title": "Home"})),
            status: obj(json!({"text": ""})),
            created_at: 0,
            updated_at: 0,
        },
    )
    .unwrap();
}
