// Audit log: append, ordering, strictly-after queries, diff decoding

mod common;

use chrono::{TimeZone, Utc};
use common::setup_db;
use pagetrail_core::diff::DiffPayload;
use pagetrail_core::model::{ActionKind, NewAuditEntry, Section, Subject, Verb};
use pagetrail_store::audit::{append_entry, get_entry, list_after, list_for_target, HistoryQuery};
use serde_json::json;

fn entry(target: &str, title: &str) -> NewAuditEntry {
    let mut changes = pagetrail_core::diff::FieldDiff::new();
    changes.insert(
        "title".into(),
        pagetrail_core::diff::FieldChange {
            old: json!("old"),
            new: json!(title),
        },
    );
    NewAuditEntry::for_diff(
        "u1",
        ActionKind::new(Subject::Settings, Verb::Update),
        target,
        DiffPayload::Fields {
            section: Section::Settings,
            changes,
        },
        json!({}),
        3,
    )
    .unwrap()
}

fn at(ms: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

#[test]
fn test_append_and_get() {
    let (_dir, conn) = setup_db();
    let written = append_entry(&conn, &entry("p1", "A"), at(1_000)).unwrap();
    let read = get_entry(&conn, &written.id).unwrap().unwrap();
    assert_eq!(read, written);
    assert_eq!(read.created_at, 1_000);
    assert!(matches!(read.diff, Some(DiffPayload::Fields { .. })));
}

#[test]
fn test_list_for_target_newest_first_with_range() {
    let (_dir, conn) = setup_db();
    append_entry(&conn, &entry("p1", "A"), at(1_000)).unwrap();
    append_entry(&conn, &entry("p1", "B"), at(2_000)).unwrap();
    append_entry(&conn, &entry("p1", "C"), at(3_000)).unwrap();
    append_entry(&conn, &entry("p2", "X"), at(2_500)).unwrap();

    let all = list_for_target(&conn, "p1", &HistoryQuery::default()).unwrap();
    let times: Vec<i64> = all.iter().map(|e| e.created_at).collect();
    assert_eq!(times, vec![3_000, 2_000, 1_000]);

    let ranged = list_for_target(
        &conn,
        "p1",
        &HistoryQuery {
            from: Some(2_000),
            to: Some(3_000),
            limit: None,
        },
    )
    .unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].created_at, 2_000);

    let limited = list_for_target(
        &conn,
        "p1",
        &HistoryQuery {
            limit: Some(2),
            ..HistoryQuery::default()
        },
    )
    .unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_list_after_breaks_ties_by_sequence() {
    let (_dir, conn) = setup_db();
    let first = append_entry(&conn, &entry("p1", "A"), at(1_000)).unwrap();
    let second = append_entry(&conn, &entry("p1", "B"), at(1_000)).unwrap();
    let third = append_entry(&conn, &entry("p1", "C"), at(2_000)).unwrap();
    append_entry(&conn, &entry("p2", "X"), at(5_000)).unwrap();

    let after: Vec<String> = list_after(&conn, &first)
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(after, vec![third.id.clone(), second.id.clone()]);

    assert!(list_after(&conn, &third).unwrap().is_empty());
}

#[test]
fn test_malformed_diff_reports_kind() {
    let (_dir, conn) = setup_db();
    let written = append_entry(&conn, &entry("p1", "A"), at(1_000)).unwrap();
    conn.execute(
        "UPDATE audit_log SET diff = '{\"shape\":\"mystery\"}' WHERE id = ?1",
        [&written.id],
    )
    .unwrap();
    let err = get_entry(&conn, &written.id).unwrap_err();
    assert_eq!(err.code(), "ERR_MALFORMED_DIFF");
}

#[test]
fn test_entry_without_diff_and_null_metadata_round_trips() {
    let (_dir, conn) = setup_db();
    let created = NewAuditEntry::without_diff(
        "u1",
        ActionKind::new(Subject::Page, Verb::Create),
        "p1",
        serde_json::Value::Null,
    );

    let written = append_entry(&conn, &created, at(1_000)).unwrap();
    let read = get_entry(&conn, &written.id).unwrap().unwrap();

    assert_eq!(read, written);
    assert_eq!(read.metadata, serde_json::Value::Null);
    assert!(read.diff.is_none());
    assert_eq!(read.action, ActionKind::new(Subject::Page, Verb::Create));
}

#[test]
fn test_scalar_and_object_metadata_round_trip() {
    let (_dir, conn) = setup_db();
    for metadata in [json!("note"), json!(7), json!({"version_id": "v1", "label": null})] {
        let created = NewAuditEntry::without_diff(
            "u1",
            ActionKind::new(Subject::Version, Verb::Backup),
            "p1",
            metadata.clone(),
        );
        let written = append_entry(&conn, &created, at(1_000)).unwrap();
        let read = get_entry(&conn, &written.id).unwrap().unwrap();
        assert_eq!(read.metadata, metadata);
    }
}
