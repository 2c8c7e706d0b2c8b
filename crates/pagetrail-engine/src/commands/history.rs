//! Audit history queries.

#![allow(clippy::result_large_err)]

use crate::commands::access::load_owned_page;
use crate::commands::elapsed_ms;
use pagetrail_core::model::AuditLogEntry;
use pagetrail_core::{log_op_end, log_op_error, log_op_start};
use pagetrail_core_types::ActorContext;
use pagetrail_store::audit::{list_for_target, HistoryQuery};
use pagetrail_store::errors::Result;
use rusqlite::Connection;

/// Audit entries for a page, newest first.
///
/// # Errors
///
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `MalformedDiff`: a stored entry carries an undecodable diff
/// - `Persistence`: database error
pub fn list_history(
    conn: &Connection,
    actor: &ActorContext,
    page_id: &str,
    query: &HistoryQuery,
) -> Result<Vec<AuditLogEntry>> {
    log_op_start!("list_history", page_id = page_id);
    let start = std::time::Instant::now();

    let entries = load_owned_page(conn, page_id, actor)
        .and_then(|_| list_for_target(conn, page_id, query))
        .map_err(|e| {
            log_op_error!("list_history", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!(
        "list_history",
        duration_ms = elapsed_ms(start),
        count = entries.len()
    );
    Ok(entries)
}
