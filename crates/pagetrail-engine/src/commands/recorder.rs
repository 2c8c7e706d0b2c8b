//! Audit Log Recorder.
//!
//! Recording never fails the caller: the append runs inside its own
//! savepoint, and on failure the savepoint is rolled back, a warning is
//! logged, and the surrounding mutation carries on.

#![allow(clippy::result_large_err)]

use crate::commands::EngineContext;
use chrono::{DateTime, Utc};
use pagetrail_core::model::{
    prepare_field_entry, ActionKind, AuditLogEntry, NewAuditEntry, Section,
};
use pagetrail_core_types::ActorContext;
use pagetrail_store::audit::append_entry;
use pagetrail_store::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use serde_json::{Map, Value};

const SAVEPOINT: &str = "audit_record";

/// Append `entry`, swallowing and logging any failure.
///
/// Works both inside a caller transaction (the savepoint nests) and on a bare
/// connection (the savepoint acts as its own transaction).
pub fn record(
    conn: &Connection,
    entry: &NewAuditEntry,
    now: DateTime<Utc>,
) -> Option<AuditLogEntry> {
    match append_in_savepoint(conn, entry, now) {
        Ok(written) => Some(written),
        Err(err) => {
            tracing::warn!(
                op = "record_mutation",
                action = %entry.action,
                target_id = %entry.target_id,
                err_code = err.code(),
                error = %err,
                "Audit entry not recorded"
            );
            None
        }
    }
}

/// Diff two versions of a singleton section and record the change.
///
/// Returns `None` both when nothing changed and when recording failed; the
/// caller never sees an error.
#[allow(clippy::too_many_arguments)]
pub fn record_mutation(
    conn: &Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    action: ActionKind,
    target_id: &str,
    section: Section,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    ignored: &[&str],
    extra: Value,
) -> Option<AuditLogEntry> {
    let entry = prepare_field_entry(
        &actor.actor_id,
        action,
        target_id,
        section,
        old,
        new,
        ignored,
        extra,
        ctx.config.summary_field_limit,
    )?;
    record(conn, &entry, ctx.clock.now())
}

fn append_in_savepoint(
    conn: &Connection,
    entry: &NewAuditEntry,
    now: DateTime<Utc>,
) -> Result<AuditLogEntry> {
    conn.execute_batch(&format!("SAVEPOINT {}", SAVEPOINT))
        .map_err(from_rusqlite)?;
    match append_entry(conn, entry, now) {
        Ok(written) => {
            conn.execute_batch(&format!("RELEASE {}", SAVEPOINT))
                .map_err(from_rusqlite)?;
            Ok(written)
        }
        Err(err) => {
            conn.execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", SAVEPOINT))
                .map_err(from_rusqlite)?;
            Err(err)
        }
    }
}
