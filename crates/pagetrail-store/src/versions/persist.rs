//! Version capture with coalescing and per-kind FIFO eviction.

#![allow(clippy::result_large_err)]

use crate::errors::{from_history, from_rusqlite, Result};
use crate::versions::query::latest_auto_version;
use chrono::{DateTime, Duration, Utc};
use pagetrail_core::snapshot::{
    compute_document_digest, decide_capture, excess, CaptureDecision, VersionDocument, VersionKind,
};
use rusqlite::{Connection, OptionalExtension};

/// Inputs for one capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest<'a> {
    pub page_id: &'a str,
    pub kind: VersionKind,
    pub label: Option<&'a str>,
    pub document: VersionDocument,
    /// Versions of `kind` to retain for this page
    pub quota: usize,
    pub cooldown: Duration,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub version_id: String,
    /// True when an existing automatic version was updated in place
    pub coalesced: bool,
    /// Ids of versions removed to respect the quota, oldest first
    pub evicted: Vec<String>,
}

/// Capture a version of a page.
///
/// An automatic capture within the cooldown of the newest automatic version
/// overwrites that version's document, appends the new change summaries to
/// its list and replaces its label only when a new one is given. Otherwise a
/// new version is written and the oldest versions of the same kind beyond
/// `quota` are deleted.
///
/// The check-then-write sequence is not locked: two concurrent captures may
/// both create, leaving one extra version.
///
/// # Errors
///
/// - `Serialization`: the document could not be encoded
/// - `Persistence`: a read or write failed
pub fn capture_version(conn: &Connection, request: CaptureRequest<'_>) -> Result<CaptureResult> {
    let latest = latest_auto_version(conn, request.page_id)?;
    let decision = decide_capture(
        request.kind,
        latest.as_ref().map(|(id, at)| (id.as_str(), *at)),
        request.now,
        request.cooldown,
    );

    match decision {
        CaptureDecision::Coalesce { version_id } => coalesce(conn, &version_id, request),
        CaptureDecision::Create => create(conn, request),
    }
}

fn coalesce(
    conn: &Connection,
    version_id: &str,
    request: CaptureRequest<'_>,
) -> Result<CaptureResult> {
    let mut document = request.document;
    let previous: Option<String> = conn
        .query_row(
            "SELECT document FROM page_versions WHERE id = ?1",
            [version_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;
    match previous.as_deref().map(VersionDocument::parse) {
        Some(Ok(old)) => {
            let mut changes = old.meta.changes;
            changes.append(&mut document.meta.changes);
            document.meta.changes = changes;
        }
        Some(Err(e)) => {
            tracing::warn!(
                version_id,
                error = %e,
                "Coalescing over unreadable version; previous change list dropped"
            );
        }
        None => {}
    }

    let text = document
        .to_json()
        .map_err(|e| from_history("capture_version", e))?;
    let digest = compute_document_digest(&text);
    conn.execute(
        "UPDATE page_versions
         SET document = ?1, digest = ?2, label = COALESCE(?3, label), updated_at = ?4
         WHERE id = ?5",
        rusqlite::params![
            text,
            digest,
            request.label,
            request.now.timestamp_millis(),
            version_id
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::debug!(version_id, page_id = request.page_id, "Coalesced version");

    Ok(CaptureResult {
        version_id: version_id.to_string(),
        coalesced: true,
        evicted: Vec::new(),
    })
}

fn create(conn: &Connection, request: CaptureRequest<'_>) -> Result<CaptureResult> {
    let version_id = uuid::Uuid::now_v7().to_string();
    let text = request
        .document
        .to_json()
        .map_err(|e| from_history("capture_version", e))?;
    let digest = compute_document_digest(&text);
    let now_ms = request.now.timestamp_millis();

    conn.execute(
        "INSERT INTO page_versions
            (id, page_id, kind, label, document, digest, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            version_id,
            request.page_id,
            request.kind.as_str(),
            request.label,
            text,
            digest,
            now_ms
        ],
    )
    .map_err(from_rusqlite)?;

    let evicted = evict(conn, request.page_id, request.kind, request.quota)?;

    tracing::debug!(
        version_id = %version_id,
        page_id = request.page_id,
        kind = request.kind.as_str(),
        evicted_count = evicted.len(),
        "Created version"
    );

    Ok(CaptureResult {
        version_id,
        coalesced: false,
        evicted,
    })
}

/// Delete the oldest versions of `kind` beyond `quota`. Other kinds are
/// never touched.
fn evict(
    conn: &Connection,
    page_id: &str,
    kind: VersionKind,
    quota: usize,
) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM page_versions
             WHERE page_id = ?1 AND kind = ?2
             ORDER BY created_at ASC, rowid ASC",
        )
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map(rusqlite::params![page_id, kind.as_str()], |row| {
            row.get::<_, String>(0)
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    let count = excess(ids.len(), quota);
    let doomed: Vec<String> = ids.into_iter().take(count).collect();
    for id in &doomed {
        conn.execute("DELETE FROM page_versions WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;
    }
    Ok(doomed)
}
