//! Read-only version queries.

#![allow(clippy::result_large_err)]

use crate::errors::{from_history, from_rusqlite, not_found, Result};
use chrono::{DateTime, TimeZone, Utc};
use pagetrail_core::snapshot::{verify_document_digest, VersionDocument, VersionKind};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

/// Version metadata without its document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionSummary {
    pub id: String,
    pub page_id: String,
    pub kind: VersionKind,
    pub label: Option<String>,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub updated_at: i64,
}

/// A version with its parsed, digest-checked document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Version {
    #[serde(flatten)]
    pub summary: VersionSummary,
    pub digest: String,
    pub document: VersionDocument,
}

/// Versions of a page, newest first, optionally of one kind.
pub fn list_versions(
    conn: &Connection,
    page_id: &str,
    kind: Option<VersionKind>,
) -> Result<Vec<VersionSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, page_id, kind, label, created_at, updated_at
             FROM page_versions
             WHERE page_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY created_at DESC, rowid DESC",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(
            rusqlite::params![page_id, kind.map(|k| k.as_str())],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            },
        )
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|(id, page_id, kind, label, created_at, updated_at)| {
            Ok(VersionSummary {
                id,
                page_id,
                kind: VersionKind::parse(&kind).map_err(|e| from_history("list_versions", e))?,
                label,
                created_at,
                updated_at,
            })
        })
        .collect()
}

/// Load one version of a page.
///
/// # Errors
///
/// - `NotFound`: no version with this id belongs to `page_id`. A version of
///   another page is reported identically.
/// - `CorruptedSnapshot`: the stored document fails its digest, is missing a
///   section, or has an unknown format
pub fn get_version(conn: &Connection, page_id: &str, version_id: &str) -> Result<Version> {
    let row = conn
        .query_row(
            "SELECT id, page_id, kind, label, created_at, updated_at, document, digest
             FROM page_versions WHERE id = ?1 AND page_id = ?2",
            rusqlite::params![version_id, page_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()
        .map_err(from_rusqlite)?
        .ok_or_else(|| not_found("get_version", "version", version_id))?;

    let (id, page_id, kind, label, created_at, updated_at, text, digest) = row;
    let corrupt = |e| from_history("get_version", e).with_entity_id(id.clone());
    verify_document_digest(&text, &digest).map_err(corrupt)?;
    let document = VersionDocument::parse(&text).map_err(corrupt)?;
    let kind = VersionKind::parse(&kind).map_err(corrupt)?;

    Ok(Version {
        summary: VersionSummary {
            id,
            page_id,
            kind,
            label,
            created_at,
            updated_at,
        },
        digest,
        document,
    })
}

/// Id and creation time of the newest automatic version of a page.
pub fn latest_auto_version(
    conn: &Connection,
    page_id: &str,
) -> Result<Option<(String, DateTime<Utc>)>> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT id, created_at FROM page_versions
             WHERE page_id = ?1 AND kind = 'auto'
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
            [page_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(row.and_then(|(id, ms)| Utc.timestamp_millis_opt(ms).single().map(|at| (id, at))))
}
