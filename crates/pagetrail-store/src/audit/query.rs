//! Read-only audit log queries.
//!
//! Entries for one target are totally ordered by `(created_at, seq)`; the
//! sequence breaks ties between entries stamped in the same millisecond.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use pagetrail_core::diff::DiffPayload;
use pagetrail_core::errors::{ExError, ExErrorKind};
use pagetrail_core::model::{ActionCategory, ActionKind, AuditLogEntry};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;

const SELECT_COLUMNS: &str = "SELECT seq, id, actor_id, action, category, target_id, created_at,
        diff, summary, changes, metadata
 FROM audit_log";

/// Filters for [`list_for_target`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryQuery {
    /// Inclusive lower bound, milliseconds
    pub from: Option<i64>,
    /// Exclusive upper bound, milliseconds
    pub to: Option<i64>,
    pub limit: Option<usize>,
}

/// Fetch one entry by id.
pub fn get_entry(conn: &Connection, log_id: &str) -> Result<Option<AuditLogEntry>> {
    let raw = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            [log_id],
            RawEntry::from_row,
        )
        .optional()
        .map_err(from_rusqlite)?;
    raw.map(RawEntry::decode).transpose()
}

/// Entries for a target, newest first.
pub fn list_for_target(
    conn: &Connection,
    target_id: &str,
    query: &HistoryQuery,
) -> Result<Vec<AuditLogEntry>> {
    let limit = query
        .limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    let sql = format!(
        "{} WHERE target_id = ?1
            AND (?2 IS NULL OR created_at >= ?2)
            AND (?3 IS NULL OR created_at < ?3)
         ORDER BY created_at DESC, seq DESC
         LIMIT ?4",
        SELECT_COLUMNS
    );
    collect(
        conn,
        &sql,
        rusqlite::params![target_id, query.from, query.to, limit],
    )
}

/// Entries for the same target created strictly after `entry`, newest first.
pub fn list_after(conn: &Connection, entry: &AuditLogEntry) -> Result<Vec<AuditLogEntry>> {
    let sql = format!(
        "{} WHERE target_id = ?1
            AND (created_at > ?2 OR (created_at = ?2 AND seq > ?3))
         ORDER BY created_at DESC, seq DESC",
        SELECT_COLUMNS
    );
    collect(
        conn,
        &sql,
        rusqlite::params![entry.target_id, entry.created_at, entry.seq],
    )
}

fn collect(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<AuditLogEntry>> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let raws = stmt
        .query_map(params, RawEntry::from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    raws.into_iter().map(RawEntry::decode).collect()
}

/// Row as read, before the diff payload is decoded.
struct RawEntry {
    seq: i64,
    id: String,
    actor_id: String,
    action: String,
    category: String,
    target_id: String,
    created_at: i64,
    diff: Option<String>,
    summary: String,
    changes: Value,
    metadata: Value,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            id: row.get(1)?,
            actor_id: row.get(2)?,
            action: row.get(3)?,
            category: row.get(4)?,
            target_id: row.get(5)?,
            created_at: row.get(6)?,
            diff: row.get(7)?,
            summary: row.get(8)?,
            changes: row.get(9)?,
            metadata: row.get(10)?,
        })
    }

    fn decode(self) -> Result<AuditLogEntry> {
        let diff = match self.diff {
            Some(text) => Some(serde_json::from_str::<DiffPayload>(&text).map_err(|e| {
                ExError::new(ExErrorKind::MalformedDiff)
                    .with_op("decode_audit_entry")
                    .with_entity_id(self.id.clone())
                    .with_message(e.to_string())
            })?),
            None => None,
        };
        let changes = match self.changes {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(AuditLogEntry {
            id: self.id,
            seq: self.seq,
            actor_id: self.actor_id,
            action: ActionKind::parse(&self.action),
            category: ActionCategory::parse(&self.category),
            target_id: self.target_id,
            created_at: self.created_at,
            diff,
            summary: self.summary,
            changes,
            metadata: self.metadata,
        })
    }
}
