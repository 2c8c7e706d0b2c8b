//! SQLite repository for pages and child-collection rows
//!
//! All functions take `&Connection` so they run inside whatever transaction
//! or savepoint the caller holds.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use pagetrail_core::deep_equal;
use pagetrail_core::model::{
    CollectionKind, CollectionShape, PageState, Section, ID_KEY, POSITION_KEY, VALUE_KEY,
};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};

/// A stored page with its singleton sections.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: String,
    pub owner_id: String,
    pub settings: Map<String, Value>,
    pub status: Map<String, Value>,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub updated_at: i64,
}

/// One child-collection row as stored: id column plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: i64,
    pub body: Value,
}

/// SQLite repository for pages
pub struct PageRepo;

impl PageRepo {
    // ----- pages -----

    pub fn create_page(conn: &Connection, page: &PageRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO pages (id, owner_id, settings, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                page.id,
                page.owner_id,
                Value::Object(page.settings.clone()),
                Value::Object(page.status.clone()),
                page.created_at,
                page.updated_at,
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Read one page
    pub fn get_page(conn: &Connection, page_id: &str) -> Result<Option<PageRecord>> {
        conn.query_row(
            "SELECT id, owner_id, settings, status, created_at, updated_at
             FROM pages WHERE id = ?1",
            [page_id],
            |row| {
                Ok(PageRecord {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    settings: object_or_empty(row.get(2)?),
                    status: object_or_empty(row.get(3)?),
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Overwrite one singleton section of a page.
    pub fn update_section(
        conn: &Connection,
        page_id: &str,
        section: Section,
        values: &Map<String, Value>,
        updated_at: i64,
    ) -> Result<()> {
        let sql = match section {
            Section::Settings => "UPDATE pages SET settings = ?1, updated_at = ?2 WHERE id = ?3",
            Section::Status => "UPDATE pages SET status = ?1, updated_at = ?2 WHERE id = ?3",
        };
        let changed = conn
            .execute(
                sql,
                rusqlite::params![Value::Object(values.clone()), updated_at, page_id],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found("update_section", "page", page_id));
        }
        Ok(())
    }

    // ----- collection rows -----

    /// Read every row of one collection for a page. Ordered collections come
    /// back sorted by position, then id; the rest in insertion order.
    pub fn list_rows(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
    ) -> Result<Vec<StoredRow>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, body FROM collection_rows
                 WHERE page_id = ?1 AND collection = ?2
                 ORDER BY id",
            )
            .map_err(from_rusqlite)?;
        let mut rows = stmt
            .query_map(rusqlite::params![page_id, kind.as_str()], |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    body: row.get(1)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        if kind.shape() == CollectionShape::Ordered {
            rows.sort_by(|a, b| {
                position(&a.body)
                    .total_cmp(&position(&b.body))
                    .then(a.id.cmp(&b.id))
            });
        }
        Ok(rows)
    }

    /// Create one row and return its new id
    pub fn create_row(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        element: &Value,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO collection_rows (page_id, collection, body) VALUES (?1, ?2, ?3)",
            rusqlite::params![page_id, kind.as_str(), to_body(kind, element)],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    /// Create many rows, returning their new ids in input order
    pub fn create_rows(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        elements: &[Value],
    ) -> Result<Vec<i64>> {
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO collection_rows (page_id, collection, body) VALUES (?1, ?2, ?3)",
            )
            .map_err(from_rusqlite)?;
        let mut ids = Vec::with_capacity(elements.len());
        for element in elements {
            let id = stmt
                .insert(rusqlite::params![page_id, kind.as_str(), to_body(kind, element)])
                .map_err(from_rusqlite)?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Recreate a row under a known id. Returns `false` without writing when
    /// the id is already taken.
    pub fn create_row_with_id(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        id: i64,
        element: &Value,
    ) -> Result<bool> {
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO collection_rows (id, page_id, collection, body)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, page_id, kind.as_str(), to_body(kind, element)],
            )
            .map_err(from_rusqlite)?;
        Ok(inserted == 1)
    }

    /// Replace one row's body. Returns `false` when the row does not exist.
    pub fn update_row(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        id: i64,
        element: &Value,
    ) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE collection_rows SET body = ?1
                 WHERE id = ?2 AND page_id = ?3 AND collection = ?4",
                rusqlite::params![to_body(kind, element), id, page_id, kind.as_str()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed == 1)
    }

    /// Replace many row bodies; returns how many rows existed
    pub fn update_rows(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        rows: &[(i64, Value)],
    ) -> Result<usize> {
        let mut updated = 0;
        for (id, element) in rows {
            if Self::update_row(conn, page_id, kind, *id, element)? {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Delete the given rows; returns how many existed
    pub fn delete_rows(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        ids: &[i64],
    ) -> Result<usize> {
        let mut stmt = conn
            .prepare_cached(
                "DELETE FROM collection_rows WHERE id = ?1 AND page_id = ?2 AND collection = ?3",
            )
            .map_err(from_rusqlite)?;
        let mut deleted = 0;
        for id in ids {
            deleted += stmt
                .execute(rusqlite::params![id, page_id, kind.as_str()])
                .map_err(from_rusqlite)?;
        }
        Ok(deleted)
    }

    /// Delete value-set rows whose value is [`deep_equal`] to one of `values`;
    /// returns how many were deleted
    pub fn delete_values(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
        values: &[Value],
    ) -> Result<usize> {
        let ids: Vec<i64> = Self::list_rows(conn, page_id, kind)?
            .into_iter()
            .filter(|row| {
                row.body
                    .get(VALUE_KEY)
                    .is_some_and(|v| values.iter().any(|r| deep_equal(r, v)))
            })
            .map(|row| row.id)
            .collect();
        Self::delete_rows(conn, page_id, kind, &ids)
    }

    /// Delete every row of one collection for a page
    pub fn delete_collection(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
    ) -> Result<usize> {
        conn.execute(
            "DELETE FROM collection_rows WHERE page_id = ?1 AND collection = ?2",
            rusqlite::params![page_id, kind.as_str()],
        )
        .map_err(from_rusqlite)
    }

    /// Rows of one collection in the shape the kernel diffs: ordered rows
    /// carry their id, value-set rows are bare scalars.
    pub fn load_collection(
        conn: &Connection,
        page_id: &str,
        kind: CollectionKind,
    ) -> Result<Vec<Value>> {
        Ok(Self::list_rows(conn, page_id, kind)?
            .into_iter()
            .map(|row| from_body(kind, row.id, row.body))
            .collect())
    }

    // ----- aggregate -----

    /// Load the full state of a page.
    ///
    /// # Errors
    ///
    /// `NotFound` if the page does not exist.
    pub fn load_page_state(conn: &Connection, page_id: &str) -> Result<PageState> {
        let page = Self::get_page(conn, page_id)?
            .ok_or_else(|| not_found("load_page_state", "page", page_id))?;

        let mut state = PageState {
            settings: page.settings,
            status: page.status,
            ..PageState::default()
        };
        for kind in CollectionKind::ALL {
            state
                .collections
                .insert(kind, Self::load_collection(conn, page_id, kind)?);
        }
        Ok(state)
    }
}

/// Row id carried by an element, if it is an integer.
pub fn row_id(element: &Value) -> Option<i64> {
    element.get(ID_KEY).and_then(Value::as_i64)
}

/// Stored body for an element: the id lives in its own column; value-set
/// scalars are wrapped.
fn to_body(kind: CollectionKind, element: &Value) -> Value {
    match kind.shape() {
        CollectionShape::ValueSet => {
            let mut body = Map::new();
            body.insert(VALUE_KEY.to_string(), element.clone());
            Value::Object(body)
        }
        CollectionShape::Ordered | CollectionShape::Unordered => match element {
            Value::Object(map) => {
                let mut body = map.clone();
                body.remove(ID_KEY);
                Value::Object(body)
            }
            other => other.clone(),
        },
    }
}

/// Element as seen by the kernel: ordered rows gain their id, unordered rows
/// stay id-less, value-set rows unwrap to the bare scalar.
fn from_body(kind: CollectionKind, id: i64, body: Value) -> Value {
    match kind.shape() {
        CollectionShape::Ordered => match body {
            Value::Object(mut map) => {
                map.insert(ID_KEY.to_string(), Value::from(id));
                Value::Object(map)
            }
            other => other,
        },
        CollectionShape::Unordered => body,
        CollectionShape::ValueSet => body.get(VALUE_KEY).cloned().unwrap_or(Value::Null),
    }
}

fn position(body: &Value) -> f64 {
    body.get(POSITION_KEY)
        .and_then(Value::as_f64)
        .unwrap_or(f64::MAX)
}

fn object_or_empty(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_strips_id_and_wraps_values() {
        assert_eq!(
            to_body(CollectionKind::Links, &json!({"id": 4, "title": "x"})),
            json!({"title": "x"})
        );
        assert_eq!(
            to_body(CollectionKind::AccentColors, &json!("#fff")),
            json!({"value": "#fff"})
        );
    }

    #[test]
    fn test_from_body_restores_shape() {
        assert_eq!(
            from_body(CollectionKind::Links, 4, json!({"title": "x"})),
            json!({"id": 4, "title": "x"})
        );
        assert_eq!(
            from_body(CollectionKind::Labels, 9, json!({"text": "new"})),
            json!({"text": "new"})
        );
        assert_eq!(
            from_body(CollectionKind::AccentColors, 2, json!({"value": "#fff"})),
            json!("#fff")
        );
    }
}
