//! Append-only writes to the audit log.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, serialization, Result};
use chrono::{DateTime, Utc};
use pagetrail_core::model::{AuditLogEntry, NewAuditEntry};
use rusqlite::Connection;
use serde_json::Value;

/// Append one entry stamped at `now`.
///
/// The entry is written through `conn`, so it commits or rolls back with the
/// caller's transaction.
///
/// # Errors
///
/// - `Serialization`: the diff payload could not be encoded
/// - `Persistence`: the insert failed
pub fn append_entry(
    conn: &Connection,
    entry: &NewAuditEntry,
    now: DateTime<Utc>,
) -> Result<AuditLogEntry> {
    let id = uuid::Uuid::now_v7().to_string();
    let created_at = now.timestamp_millis();
    let diff = entry
        .diff
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| serialization("append_entry", e))?;
    let changes = Value::from(entry.changes.clone());
    // Bound as JSON text: a bare `Value::Null` would bind as SQL NULL.
    let metadata =
        serde_json::to_string(&entry.metadata).map_err(|e| serialization("append_entry", e))?;

    conn.execute(
        r#"
        INSERT INTO audit_log (
            id, actor_id, action, category, target_id, created_at,
            diff, summary, changes, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        rusqlite::params![
            id,
            entry.actor_id,
            entry.action.tag(),
            entry.category.as_str(),
            entry.target_id,
            created_at,
            diff,
            entry.summary,
            changes,
            metadata,
        ],
    )
    .map_err(from_rusqlite)?;
    let seq = conn.last_insert_rowid();

    tracing::debug!(
        log_id = %id,
        seq,
        action = %entry.action,
        target_id = %entry.target_id,
        "Appended audit entry"
    );

    Ok(AuditLogEntry {
        id,
        seq,
        actor_id: entry.actor_id.clone(),
        action: entry.action.clone(),
        category: entry.category,
        target_id: entry.target_id.clone(),
        created_at,
        diff: entry.diff.clone(),
        summary: entry.summary.clone(),
        changes: entry.changes.clone(),
        metadata: entry.metadata.clone(),
    })
}
