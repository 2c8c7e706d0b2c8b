//! Version commands: capture, list, get.
//!
//! Captures read the page's current state in their own transaction. The
//! automatic capture that follows a mutation is best-effort: a failure is
//! logged and never reaches the caller of the mutation.

#![allow(clippy::result_large_err)]

use crate::commands::access::load_owned_page;
use crate::commands::recorder;
use crate::commands::{elapsed_ms, EngineContext};
use pagetrail_core::model::{ActionKind, NewAuditEntry, Subject, Verb};
use pagetrail_core::snapshot::{VersionDocument, VersionKind};
use pagetrail_core::{log_op_end, log_op_error, log_op_start};
use pagetrail_core_types::ActorContext;
use pagetrail_store::errors::{from_rusqlite, Result};
use pagetrail_store::repo::PageRepo;
use pagetrail_store::versions::{self as store_versions, CaptureRequest, CaptureResult};
use pagetrail_store::versions::{Version, VersionSummary};
use rusqlite::Connection;
use serde_json::json;

/// Capture a version of a page.
///
/// Manual captures ("backups") bypass coalescing, count against the manual
/// quota, and leave a `version.backup` audit entry. Automatic captures may
/// coalesce into the newest automatic version.
///
/// ## Errors
///
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `Persistence`: database error
pub fn capture_version(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    label: Option<&str>,
    kind: VersionKind,
) -> Result<CaptureResult> {
    log_op_start!("capture_version", page_id = page_id, kind = kind.as_str());
    let start = std::time::Instant::now();

    let result = capture_version_impl(conn, ctx, actor, page_id, label, kind).map_err(|e| {
        log_op_error!("capture_version", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "capture_version",
        duration_ms = elapsed_ms(start),
        version_id = result.version_id.as_str(),
        coalesced = result.coalesced,
        evicted_count = result.evicted.len()
    );

    Ok(result)
}

fn capture_version_impl(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    label: Option<&str>,
    kind: VersionKind,
) -> Result<CaptureResult> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    load_owned_page(&tx, page_id, actor)?;

    let changes = match kind {
        VersionKind::Manual => vec![label.unwrap_or("Saved a backup").to_string()],
        VersionKind::Auto => Vec::new(),
    };
    let result = capture_in(&tx, ctx, actor, page_id, label, kind, changes)?;

    if kind == VersionKind::Manual {
        let entry = NewAuditEntry::without_diff(
            &actor.actor_id,
            ActionKind::new(Subject::Version, Verb::Backup),
            page_id,
            json!({ "version_id": result.version_id, "label": label }),
        );
        recorder::record(&tx, &entry, ctx.clock.now());
    }

    tx.commit().map_err(from_rusqlite)?;
    Ok(result)
}

/// Automatic capture after a committed mutation. Failures are logged.
pub(crate) fn auto_capture(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    changes: Vec<String>,
) -> Option<CaptureResult> {
    let attempt = (|| -> Result<CaptureResult> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let result = capture_in(&tx, ctx, actor, page_id, None, VersionKind::Auto, changes)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(result)
    })();

    match attempt {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::warn!(
                op = "auto_capture",
                page_id = page_id,
                err_code = err.code(),
                error = %err,
                "Automatic version capture failed"
            );
            None
        }
    }
}

fn capture_in(
    conn: &Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    label: Option<&str>,
    kind: VersionKind,
    changes: Vec<String>,
) -> Result<CaptureResult> {
    let state = PageRepo::load_page_state(conn, page_id)?;
    let now = ctx.clock.now();
    store_versions::capture_version(
        conn,
        CaptureRequest {
            page_id,
            kind,
            label,
            document: VersionDocument::from_state(&state, now, changes),
            quota: ctx.config.quota(actor.tier, kind),
            cooldown: ctx.config.cooldown(),
            now,
        },
    )
}

/// List a page's versions, newest first.
pub fn list_versions(
    conn: &Connection,
    actor: &ActorContext,
    page_id: &str,
) -> Result<Vec<VersionSummary>> {
    log_op_start!("list_versions", page_id = page_id);
    let start = std::time::Instant::now();

    let result = load_owned_page(conn, page_id, actor)
        .and_then(|_| store_versions::list_versions(conn, page_id, None))
        .map_err(|e| {
            log_op_error!("list_versions", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!(
        "list_versions",
        duration_ms = elapsed_ms(start),
        count = result.len()
    );
    Ok(result)
}

/// Load one version of a page.
///
/// ## Errors
///
/// - `NotFound`: unknown version, or a version of another page
/// - `Unauthorized`: the actor does not own the page
/// - `CorruptedSnapshot`: the stored document is unreadable
pub fn get_version(
    conn: &Connection,
    actor: &ActorContext,
    page_id: &str,
    version_id: &str,
) -> Result<Version> {
    log_op_start!("get_version", page_id = page_id, version_id = version_id);
    let start = std::time::Instant::now();

    let result = load_owned_page(conn, page_id, actor)
        .and_then(|_| store_versions::get_version(conn, page_id, version_id))
        .map_err(|e| {
            log_op_error!("get_version", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!("get_version", duration_ms = elapsed_ms(start));
    Ok(result)
}
