use chrono::{DateTime, TimeZone, Utc};
use pagetrail_core::model::{CollectionKind, CollectionShape, PageState};
use pagetrail_core_types::{AccountTier, ActorContext};
use pagetrail_engine::commands::mutation::{self, MutationOutcome};
use pagetrail_engine::EngineContext;
use pagetrail_store::audit::{list_for_target, HistoryQuery};
use pagetrail_store::repo::PageRepo;
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

/// Temp database with migrations applied
#[allow(dead_code)]
pub fn setup_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let conn = pagetrail_store::db::open_ready(temp_dir.path().join("test.db")).unwrap();
    (temp_dir, conn)
}

#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

#[allow(dead_code)]
pub fn obj(v: Value) -> Map<String, Value> {
    v.as_object().unwrap().clone()
}

#[allow(dead_code)]
pub fn owner() -> ActorContext {
    ActorContext::new("user-1", AccountTier::Free)
}

#[allow(dead_code)]
pub fn stranger() -> ActorContext {
    ActorContext::new("user-2", AccountTier::Free)
}

/// Create a page owned by [`owner`] with a title and status text
#[allow(dead_code)]
pub fn seed_page(conn: &mut Connection, ctx: EngineContext<'_>) -> String {
    mutation::create_page(
        conn,
        ctx,
        &owner(),
        obj(json!({"title": "Home", "bio": "hello"})),
        obj(json!({"text": "Open", "visible": true})),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn state(conn: &Connection, page_id: &str) -> PageState {
    PageRepo::load_page_state(conn, page_id).unwrap()
}

/// Page state with value sets sorted, for comparisons where only set
/// membership matters.
#[allow(dead_code)]
pub fn normalized(mut state: PageState) -> PageState {
    for kind in CollectionKind::ALL {
        if kind.shape() == CollectionShape::ValueSet {
            if let Some(values) = state.collections.get_mut(&kind) {
                values.sort_by_key(|v| v.to_string());
            }
        }
    }
    state
}

#[allow(dead_code)]
pub fn history_len(conn: &Connection, page_id: &str) -> usize {
    list_for_target(conn, page_id, &HistoryQuery::default())
        .unwrap()
        .len()
}

#[allow(dead_code)]
pub fn applied(outcome: MutationOutcome) -> pagetrail_engine::AppliedMutation {
    match outcome {
        MutationOutcome::Applied(applied) => applied,
        MutationOutcome::NoOp => panic!("expected the mutation to apply"),
    }
}

/// Ids of an ordered collection in stored order
#[allow(dead_code)]
pub fn ids(conn: &Connection, page_id: &str, kind: CollectionKind) -> Vec<i64> {
    state(conn, page_id)
        .collection(kind)
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}
