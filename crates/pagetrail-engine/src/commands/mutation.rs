//! Mutation commands.
//!
//! These produce the history the rest of the engine consumes. Each one runs
//! the same pipeline:
//!
//! 1. load the page (ownership checked) inside a transaction
//! 2. diff the submitted data against the stored state
//! 3. return [`MutationOutcome::NoOp`] without writing when the diff is empty
//! 4. apply the change and record an audit entry (failures swallowed)
//! 5. commit, then attempt an automatic version capture (failures logged)

#![allow(clippy::result_large_err)]

use crate::commands::access::load_owned_page;
use crate::commands::recorder;
use crate::commands::versions::auto_capture;
use crate::commands::{elapsed_ms, strip_id, EngineContext, IGNORED_FIELDS};
use pagetrail_core::deep_equal;
use pagetrail_core::diff::{
    diff_collection, diff_fields, diff_values, CollectionDiff, DiffPayload,
};
use pagetrail_core::errors::{ExError, ExErrorKind};
use pagetrail_core::model::{
    ActionKind, AuditLogEntry, CollectionKind, CollectionShape, NewAuditEntry, PageState,
    Section, Subject, Verb, ID_KEY, POSITION_KEY,
};
use pagetrail_core::{log_op_end, log_op_error, log_op_start};
use pagetrail_core_types::ActorContext;
use pagetrail_store::errors::{from_rusqlite, Result};
use pagetrail_store::repo::{row_id, PageRecord, PageRepo};
use pagetrail_store::versions::CaptureResult;
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Fields left out of recorded collection diffs. Order is carried by the
/// `reordered` flag and `previous_order`.
const COLLECTION_IGNORED_FIELDS: [&str; 3] = ["created_at", "updated_at", POSITION_KEY];

/// Result of a mutation command.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Nothing changed; nothing was written, logged or captured
    NoOp,
    Applied(AppliedMutation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMutation {
    /// `None` when the audit entry could not be recorded
    pub log_entry: Option<AuditLogEntry>,
    /// `None` when the automatic capture failed
    pub version: Option<CaptureResult>,
}

impl MutationOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, MutationOutcome::NoOp)
    }

    pub fn log_entry(&self) -> Option<&AuditLogEntry> {
        match self {
            MutationOutcome::NoOp => None,
            MutationOutcome::Applied(applied) => applied.log_entry.as_ref(),
        }
    }
}

/// Create a page owned by the acting user and capture its first version.
///
/// Returns the new page id.
///
/// # Errors
///
/// - `Persistence`: database error
pub fn create_page(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    settings: Map<String, Value>,
    status: Map<String, Value>,
) -> Result<String> {
    log_op_start!("create_page", actor_id = actor.actor_id.as_str());
    let start = std::time::Instant::now();

    let page_id = create_page_impl(conn, ctx, actor, settings, status).map_err(|e| {
        log_op_error!("create_page", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "create_page",
        duration_ms = elapsed_ms(start),
        page_id = page_id.as_str()
    );
    Ok(page_id)
}

fn create_page_impl(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    settings: Map<String, Value>,
    status: Map<String, Value>,
) -> Result<String> {
    let now = ctx.clock.now();
    let page = PageRecord {
        id: uuid::Uuid::now_v7().to_string(),
        owner_id: actor.actor_id.clone(),
        settings,
        status,
        created_at: now.timestamp_millis(),
        updated_at: now.timestamp_millis(),
    };

    let tx = conn.transaction().map_err(from_rusqlite)?;
    PageRepo::create_page(&tx, &page)?;
    let entry = NewAuditEntry::without_diff(
        &actor.actor_id,
        ActionKind::new(Subject::Page, Verb::Create),
        &page.id,
        Value::Null,
    );
    recorder::record(&tx, &entry, now);
    tx.commit().map_err(from_rusqlite)?;

    auto_capture(conn, ctx, actor, &page.id, vec![entry.summary]);
    Ok(page.id)
}

/// Merge `patch` into the page settings. A `null` value removes the key.
///
/// # Errors
///
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `Persistence`: database error
pub fn update_settings(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    patch: &Map<String, Value>,
) -> Result<MutationOutcome> {
    update_section(conn, ctx, actor, page_id, Section::Settings, patch)
}

/// Merge `patch` into the page status bar. A `null` value removes the key.
///
/// # Errors
///
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `Persistence`: database error
pub fn update_status(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    patch: &Map<String, Value>,
) -> Result<MutationOutcome> {
    update_section(conn, ctx, actor, page_id, Section::Status, patch)
}

fn update_section(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    section: Section,
    patch: &Map<String, Value>,
) -> Result<MutationOutcome> {
    let op = match section {
        Section::Settings => "update_settings",
        Section::Status => "update_status",
    };
    run_logged(op, page_id, || {
        run_pipeline(conn, ctx, actor, page_id, |tx, state| {
            let old = state.section(section);
            let merged = merge_patch(old, patch);
            if diff_fields(old, &merged, &IGNORED_FIELDS).is_empty() {
                return Ok(None);
            }
            PageRepo::update_section(
                tx,
                page_id,
                section,
                &merged,
                ctx.clock.now().timestamp_millis(),
            )?;
            let subject = match section {
                Section::Settings => Subject::Settings,
                Section::Status => Subject::Status,
            };
            let action = ActionKind::new(subject, Verb::Update);
            let fallback = action.phrase();
            let log_entry = recorder::record_mutation(
                tx,
                ctx,
                actor,
                action,
                page_id,
                section,
                old,
                &merged,
                &IGNORED_FIELDS,
                Value::Null,
            );
            Ok(Some(Recorded::from_entry(log_entry, fallback)))
        })
    })
}

/// Save the full contents of an ordered collection.
///
/// Positions follow the submitted order. Submitted elements whose `id`
/// names an existing row update it; the rest are created. Existing rows
/// missing from the submission are deleted.
///
/// # Errors
///
/// - `InvalidInput`: `kind` is not an ordered collection
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `Persistence`: database error
pub fn save_ordered_collection(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    kind: CollectionKind,
    submitted: Vec<Value>,
) -> Result<MutationOutcome> {
    run_logged("save_ordered_collection", page_id, || {
        require_shape(kind, CollectionShape::Ordered, "save_ordered_collection")?;
        let submitted = with_positions(submitted)?;
        run_pipeline(conn, ctx, actor, page_id, |tx, state| {
            let old = state.collection(kind);
            let planned = diff_collection(old, &submitted, ID_KEY, &COLLECTION_IGNORED_FIELDS);
            if planned.is_empty() {
                return Ok(None);
            }
            apply_ordered(tx, page_id, kind, old, &submitted)?;

            let reloaded = PageRepo::load_collection(tx, page_id, kind)?;
            let diff = diff_collection(old, &reloaded, ID_KEY, &COLLECTION_IGNORED_FIELDS);
            let action = ActionKind::collection(kind, verb_for(&diff));
            let payload = DiffPayload::Collection {
                collection: kind,
                diff,
            };
            Ok(record_payload(tx, ctx, actor, page_id, action, payload))
        })
    })
}

/// Replace every row of an unordered collection.
///
/// # Errors
///
/// - `InvalidInput`: `kind` is not an unordered collection
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `Persistence`: database error
pub fn replace_unordered_collection(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    kind: CollectionKind,
    rows: Vec<Value>,
) -> Result<MutationOutcome> {
    run_logged("replace_unordered_collection", page_id, || {
        require_shape(kind, CollectionShape::Unordered, "replace_unordered_collection")?;
        run_pipeline(conn, ctx, actor, page_id, |tx, state| {
            let old = state.collection(kind).to_vec();
            let rows: Vec<Value> = rows.iter().map(strip_id).collect();
            if deep_equal(&Value::Array(old.clone()), &Value::Array(rows.clone())) {
                return Ok(None);
            }
            PageRepo::delete_collection(tx, page_id, kind)?;
            PageRepo::create_rows(tx, page_id, kind, &rows)?;

            let new = PageRepo::load_collection(tx, page_id, kind)?;
            let action = ActionKind::collection(kind, Verb::Replace);
            let payload = DiffPayload::Swap {
                collection: kind,
                old,
                new,
            };
            Ok(record_payload(tx, ctx, actor, page_id, action, payload))
        })
    })
}

/// Set the contents of a value-set collection. Duplicates are dropped.
///
/// # Errors
///
/// - `InvalidInput`: `kind` is not a value-set collection
/// - `NotFound` / `Unauthorized`: page missing or not owned by the actor
/// - `Persistence`: database error
pub fn set_value_collection(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    kind: CollectionKind,
    values: Vec<Value>,
) -> Result<MutationOutcome> {
    run_logged("set_value_collection", page_id, || {
        require_shape(kind, CollectionShape::ValueSet, "set_value_collection")?;
        let values = dedup_values(values);
        run_pipeline(conn, ctx, actor, page_id, |tx, state| {
            let diff = diff_values(state.collection(kind), &values);
            if diff.is_empty() {
                return Ok(None);
            }
            PageRepo::delete_values(tx, page_id, kind, &diff.removed)?;
            PageRepo::create_rows(tx, page_id, kind, &diff.added)?;

            let verb = if diff.removed.is_empty() {
                Verb::Create
            } else if diff.added.is_empty() {
                Verb::Delete
            } else {
                Verb::Update
            };
            let payload = DiffPayload::Values {
                collection: kind,
                added: diff.added,
                removed: diff.removed,
            };
            Ok(record_payload(
                tx,
                ctx,
                actor,
                page_id,
                ActionKind::collection(kind, verb),
                payload,
            ))
        })
    })
}

// ----- pipeline -----

/// What the apply step recorded, carried out of the transaction.
struct Recorded {
    log_entry: Option<AuditLogEntry>,
    changes: Vec<String>,
}

impl Recorded {
    /// `fallback` labels the version when the entry could not be recorded.
    fn from_entry(log_entry: Option<AuditLogEntry>, fallback: String) -> Self {
        let summary = log_entry
            .as_ref()
            .map(|e| e.summary.clone())
            .unwrap_or(fallback);
        Self {
            log_entry,
            changes: vec![summary],
        }
    }
}

fn run_logged(
    op: &str,
    page_id: &str,
    body: impl FnOnce() -> Result<MutationOutcome>,
) -> Result<MutationOutcome> {
    log_op_start!(op, page_id = page_id);
    let start = std::time::Instant::now();

    let outcome = body().map_err(|e| {
        log_op_error!(op, e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        op,
        duration_ms = elapsed_ms(start),
        noop = outcome.is_noop(),
        logged = outcome.log_entry().is_some()
    );
    Ok(outcome)
}

/// Load, apply, commit, capture. `apply` returns `None` to signal a no-op
/// and must not have written anything in that case.
fn run_pipeline<F>(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    apply: F,
) -> Result<MutationOutcome>
where
    F: FnOnce(&Connection, &PageState) -> Result<Option<Recorded>>,
{
    let tx = conn.transaction().map_err(from_rusqlite)?;
    load_owned_page(&tx, page_id, actor)?;
    let state = PageRepo::load_page_state(&tx, page_id)?;

    let tx_conn: &Connection = &tx;
    let recorded = match apply(tx_conn, &state)? {
        Some(recorded) => recorded,
        None => {
            tracing::debug!(page_id = page_id, "No changes; skipping write");
            return Ok(MutationOutcome::NoOp);
        }
    };
    tx.commit().map_err(from_rusqlite)?;

    let version = auto_capture(conn, ctx, actor, page_id, recorded.changes);
    Ok(MutationOutcome::Applied(AppliedMutation {
        log_entry: recorded.log_entry,
        version,
    }))
}

fn record_payload(
    conn: &Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    action: ActionKind,
    payload: DiffPayload,
) -> Option<Recorded> {
    let entry = NewAuditEntry::for_diff(
        &actor.actor_id,
        action,
        page_id,
        payload,
        Value::Null,
        ctx.config.summary_field_limit,
    )?;
    let changes = vec![entry.summary.clone()];
    let log_entry = recorder::record(conn, &entry, ctx.clock.now());
    Some(Recorded { log_entry, changes })
}

// ----- helpers -----

fn require_shape(kind: CollectionKind, expected: CollectionShape, op: &str) -> Result<()> {
    if kind.shape() != expected {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op(op)
            .with_entity_id(kind.as_str())
            .with_message(format!("{} cannot be written by {}", kind.plural(), op)));
    }
    Ok(())
}

fn merge_patch(old: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = old.clone();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn with_positions(submitted: Vec<Value>) -> Result<Vec<Value>> {
    submitted
        .into_iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::Object(mut map) => {
                map.insert(POSITION_KEY.to_string(), json!(index));
                Ok(Value::Object(map))
            }
            _ => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("save_ordered_collection")
                .with_message(format!("element {} is not an object", index))),
        })
        .collect()
}

fn dedup_values(values: Vec<Value>) -> Vec<Value> {
    let mut kept: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !kept.iter().any(|k| deep_equal(k, &value)) {
            kept.push(value);
        }
    }
    kept
}

/// Reconcile stored rows with the submission: update known ids whose body
/// changed, create the rest, delete what is gone.
fn apply_ordered(
    conn: &Connection,
    page_id: &str,
    kind: CollectionKind,
    old: &[Value],
    submitted: &[Value],
) -> Result<()> {
    let existing: HashSet<i64> = old.iter().filter_map(row_id).collect();
    let mut kept = HashSet::new();
    let mut updates = Vec::new();
    let mut creates = Vec::new();

    for element in submitted {
        match row_id(element).filter(|id| existing.contains(id) && !kept.contains(id)) {
            Some(id) => {
                kept.insert(id);
                let unchanged = old
                    .iter()
                    .find(|o| row_id(o) == Some(id))
                    .is_some_and(|o| deep_equal(o, element));
                if !unchanged {
                    updates.push((id, element.clone()));
                }
            }
            None => creates.push(strip_id(element)),
        }
    }
    let deletes: Vec<i64> = existing.difference(&kept).copied().collect();

    PageRepo::delete_rows(conn, page_id, kind, &deletes)?;
    PageRepo::update_rows(conn, page_id, kind, &updates)?;
    PageRepo::create_rows(conn, page_id, kind, &creates)?;
    tracing::debug!(
        page_id = page_id,
        collection = kind.as_str(),
        created = creates.len(),
        updated = updates.len(),
        deleted = deletes.len(),
        "Reconciled ordered collection"
    );
    Ok(())
}

/// Verb describing a collection diff.
fn verb_for(diff: &CollectionDiff) -> Verb {
    let added = !diff.added.is_empty();
    let removed = !diff.removed.is_empty();
    let updated = !diff.updated.is_empty();
    match (added, removed, updated, diff.reordered) {
        (true, false, false, false) => Verb::Create,
        (false, true, false, false) => Verb::Delete,
        (false, false, false, true) => Verb::Reorder,
        _ => Verb::Update,
    }
}
