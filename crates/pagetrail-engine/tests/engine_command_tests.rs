// EngineCommand dispatch

mod common;

use common::{obj, owner, setup_db, state, t0};
use pagetrail_core::model::CollectionKind;
use pagetrail_core::{FixedClock, HistoryConfig};
use pagetrail_engine::{apply_engine_command, EngineCommand, EngineCommandResult, EngineContext};
use serde_json::json;

#[test]
fn test_commands_round_trip_through_dispatcher() {
    let (_dir, mut conn) = setup_db();
    let config = HistoryConfig::default();
    let clock = FixedClock::new(t0());
    let ctx = EngineContext::new(&config, &clock);
    let actor = owner();

    let page_id = match apply_engine_command(
        EngineCommand::CreatePage {
            settings: obj(json!({"title": "Home"})),
            status: obj(json!({})),
        },
        &mut conn,
        ctx,
        &actor,
    )
    .unwrap()
    {
        EngineCommandResult::PageCreated { page_id } => page_id,
        other => panic!("unexpected result {:?}", other),
    };

    let backup = match apply_engine_command(
        EngineCommand::CaptureVersion {
            page_id: page_id.clone(),
            label: Some("start".into()),
            manual: true,
        },
        &mut conn,
        ctx,
        &actor,
    )
    .unwrap()
    {
        EngineCommandResult::VersionCaptured(result) => result,
        other => panic!("unexpected result {:?}", other),
    };

    let result = apply_engine_command(
        EngineCommand::SaveOrderedCollection {
            page_id: page_id.clone(),
            collection: CollectionKind::Links,
            elements: vec![json!({"title": "Blog"})],
        },
        &mut conn,
        ctx,
        &actor,
    )
    .unwrap();
    assert!(matches!(result, EngineCommandResult::Mutation(ref m) if !m.is_noop()));

    let result = apply_engine_command(
        EngineCommand::RestoreFromVersion {
            page_id: page_id.clone(),
            version_id: backup.version_id,
        },
        &mut conn,
        ctx,
        &actor,
    )
    .unwrap();
    assert!(matches!(result, EngineCommandResult::Restored(_)));
    assert!(state(&conn, &page_id)
        .collection(CollectionKind::Links)
        .is_empty());
}

#[test]
fn test_backup_is_recorded_in_history() {
    let (_dir, mut conn) = setup_db();
    let config = HistoryConfig::default();
    let clock = FixedClock::new(t0());
    let ctx = EngineContext::new(&config, &clock);
    let page_id = common::seed_page(&mut conn, ctx);

    apply_engine_command(
        EngineCommand::CaptureVersion {
            page_id: page_id.clone(),
            label: Some("before launch".into()),
            manual: true,
        },
        &mut conn,
        ctx,
        &owner(),
    )
    .unwrap();

    let history = pagetrail_engine::commands::history::list_history(
        &conn,
        &owner(),
        &page_id,
        &Default::default(),
    )
    .unwrap();
    assert_eq!(history[0].action.tag(), "version.backup");
    assert_eq!(history[0].metadata["label"], json!("before launch"));
}
