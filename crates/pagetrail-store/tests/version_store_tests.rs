// Version capture: coalescing window, FIFO eviction per kind, digest checks

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{obj, setup_db};
use pagetrail_core::model::PageState;
use pagetrail_core::snapshot::{VersionDocument, VersionKind};
use pagetrail_store::versions::{capture_version, get_version, list_versions, CaptureRequest};
use rusqlite::Connection;
use serde_json::json;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn state(title: &str) -> PageState {
    PageState {
        settings: obj(json!({"title": title})),
        ..PageState::default()
    }
}

fn capture(
    conn: &Connection,
    kind: VersionKind,
    title: &str,
    label: Option<&str>,
    quota: usize,
    now: DateTime<Utc>,
) -> pagetrail_store::versions::CaptureResult {
    capture_version(
        conn,
        CaptureRequest {
            page_id: "p1",
            kind,
            label,
            document: VersionDocument::from_state(
                &state(title),
                now,
                vec![format!("set {}", title)],
            ),
            quota,
            cooldown: Duration::seconds(300),
            now,
        },
    )
    .unwrap()
}

#[test]
fn test_captures_within_cooldown_coalesce() {
    let (_dir, conn) = setup_db();
    let first = capture(&conn, VersionKind::Auto, "A", Some("first"), 10, t(0));
    let second = capture(&conn, VersionKind::Auto, "B", None, 10, t(60));

    assert!(!first.coalesced);
    assert!(second.coalesced);
    assert_eq!(first.version_id, second.version_id);

    let versions = list_versions(&conn, "p1", None).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].label.as_deref(), Some("first"));

    let version = get_version(&conn, "p1", &first.version_id).unwrap();
    assert_eq!(version.document.settings["title"], "B");
    assert_eq!(
        version.document.meta.changes,
        vec!["set A".to_string(), "set B".to_string()]
    );
}

#[test]
fn test_capture_after_cooldown_creates_second_version() {
    let (_dir, conn) = setup_db();
    capture(&conn, VersionKind::Auto, "A", None, 10, t(0));
    capture(&conn, VersionKind::Auto, "B", None, 10, t(60));
    let third = capture(&conn, VersionKind::Auto, "C", None, 10, t(400));

    assert!(!third.coalesced);
    let versions = list_versions(&conn, "p1", None).unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].id, third.version_id);
}

#[test]
fn test_manual_captures_bypass_coalescing() {
    let (_dir, conn) = setup_db();
    capture(&conn, VersionKind::Auto, "A", None, 10, t(0));
    let manual = capture(&conn, VersionKind::Manual, "B", Some("backup"), 3, t(1));
    assert!(!manual.coalesced);
    assert_eq!(list_versions(&conn, "p1", None).unwrap().len(), 2);
}

#[test]
fn test_eviction_is_fifo_per_kind() {
    let (_dir, conn) = setup_db();
    let quota = 3;
    let manual = capture(&conn, VersionKind::Manual, "M", None, 2, t(0));

    let mut created = Vec::new();
    for i in 0..=quota {
        let result = capture(
            &conn,
            VersionKind::Auto,
            &format!("v{}", i),
            None,
            quota,
            t(1_000 * (i as i64 + 1)),
        );
        created.push(result);
    }
    assert_eq!(created[quota].evicted, vec![created[0].version_id.clone()]);

    let autos = list_versions(&conn, "p1", Some(VersionKind::Auto)).unwrap();
    let kept: Vec<&str> = autos.iter().map(|v| v.id.as_str()).collect();
    let expected: Vec<&str> = created[1..]
        .iter()
        .rev()
        .map(|c| c.version_id.as_str())
        .collect();
    assert_eq!(kept, expected);

    let manuals = list_versions(&conn, "p1", Some(VersionKind::Manual)).unwrap();
    assert_eq!(manuals.len(), 1);
    assert_eq!(manuals[0].id, manual.version_id);
}

#[test]
fn test_manual_quota_does_not_evict_autos() {
    let (_dir, conn) = setup_db();
    capture(&conn, VersionKind::Auto, "A", None, 10, t(0));
    for i in 0..3 {
        capture(&conn, VersionKind::Manual, "M", None, 1, t(10 + i));
    }
    assert_eq!(list_versions(&conn, "p1", Some(VersionKind::Manual)).unwrap().len(), 1);
    assert_eq!(list_versions(&conn, "p1", Some(VersionKind::Auto)).unwrap().len(), 1);
}

#[test]
fn test_get_version_of_other_page_is_not_found() {
    let (_dir, conn) = setup_db();
    let created = capture(&conn, VersionKind::Manual, "A", None, 3, t(0));

    let foreign = get_version(&conn, "p2", &created.version_id).unwrap_err();
    let missing = get_version(&conn, "p2", "does-not-exist").unwrap_err();
    assert_eq!(foreign.code(), "ERR_NOT_FOUND");
    assert_eq!(foreign.message(), missing.message());
}

#[test]
fn test_tampered_document_is_corrupted() {
    let (_dir, conn) = setup_db();
    let created = capture(&conn, VersionKind::Manual, "A", None, 3, t(0));
    conn.execute(
        "UPDATE page_versions SET document = replace(document, '\"A\"', '\"Z\"') WHERE id = ?1",
        [&created.version_id],
    )
    .unwrap();
    let err = get_version(&conn, "p1", &created.version_id).unwrap_err();
    assert_eq!(err.code(), "ERR_CORRUPTED_SNAPSHOT");
}

#[test]
fn test_document_missing_section_is_corrupted() {
    let (_dir, conn) = setup_db();
    let created = capture(&conn, VersionKind::Manual, "A", None, 3, t(0));
    let text = r#"{"format_version":1,"settings":{},"collections":{},"meta":{"captured_at":"2024-01-01T00:00:00Z","changes":[]}}"#;
    let digest = pagetrail_core::snapshot::compute_document_digest(text);
    conn.execute(
        "UPDATE page_versions SET document = ?1, digest = ?2 WHERE id = ?3",
        rusqlite::params![text, digest, created.version_id],
    )
    .unwrap();
    let err = get_version(&conn, "p1", &created.version_id).unwrap_err();
    assert_eq!(err.code(), "ERR_CORRUPTED_SNAPSHOT");
}
