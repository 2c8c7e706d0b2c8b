//! Restore by reverting audit entries.
//!
//! Every entry for the page created strictly after the target entry is
//! reverted, newest first, so each revert sees exactly the state its entry
//! produced. Entries without a diff (creations, backups, earlier restores)
//! are skipped.

#![allow(clippy::result_large_err)]

use crate::commands::access::load_owned_page;
use crate::commands::restore::{RestoreOutcome, RestoreStrategy};
use crate::commands::{recorder, strip_id, EngineContext};
use pagetrail_core::deep_equal;
use pagetrail_core::diff::{CollectionDiff, DiffPayload, FieldDiff};
use pagetrail_core::model::{
    ActionKind, AuditLogEntry, CollectionKind, NewAuditEntry, Section, Subject, Verb,
    POSITION_KEY,
};
use pagetrail_core_types::ActorContext;
use pagetrail_store::audit::{get_entry, list_after};
use pagetrail_store::errors::{not_found, Result};
use pagetrail_store::repo::{row_id, PageRepo};
use rusqlite::{Connection, Transaction};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Undo every change recorded after one audit entry.
#[derive(Debug, Clone)]
pub struct DiffReplay {
    log_id: String,
    page_id: Option<String>,
}

impl DiffReplay {
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            page_id: None,
        }
    }

    /// Require the entry to belong to `page_id`. An entry of another page is
    /// reported exactly like a missing one.
    pub fn for_page(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    fn load_target(&self, conn: &Connection) -> Result<AuditLogEntry> {
        get_entry(conn, &self.log_id)?
            .filter(|entry| {
                self.page_id
                    .as_deref()
                    .map_or(true, |page_id| page_id == entry.target_id)
            })
            .ok_or_else(|| not_found("restore_to_log_entry", "audit log entry", &self.log_id))
    }
}

impl RestoreStrategy for DiffReplay {
    fn name(&self) -> &'static str {
        "restore_to_log_entry"
    }

    fn apply(
        &self,
        tx: &Transaction<'_>,
        ctx: EngineContext<'_>,
        actor: &ActorContext,
    ) -> Result<RestoreOutcome> {
        let target = self.load_target(tx)?;
        let page_id = target.target_id.as_str();
        load_owned_page(tx, page_id, actor)?;

        let stamp = ctx.clock.now().timestamp_millis();
        let mut reverted_count = 0;
        for entry in list_after(tx, &target)? {
            match &entry.diff {
                Some(payload) if !payload.is_empty() => {
                    revert(tx, page_id, payload, stamp)?;
                    reverted_count += 1;
                }
                _ => tracing::debug!(
                    log_id = entry.id.as_str(),
                    action = %entry.action,
                    "Skipping entry without diff"
                ),
            }
        }

        let log_entry = if reverted_count > 0 {
            let entry = NewAuditEntry::without_diff(
                &actor.actor_id,
                ActionKind::new(Subject::History, Verb::Restore),
                page_id,
                json!({
                    "target_log_id": target.id,
                    "reverted_count": reverted_count,
                }),
            );
            recorder::record(tx, &entry, ctx.clock.now())
        } else {
            None
        };

        Ok(RestoreOutcome {
            page_id: target.target_id.clone(),
            reverted_count,
            rows_restored: 0,
            log_entry,
        })
    }
}

/// Apply the inverse of one recorded diff.
fn revert(conn: &Connection, page_id: &str, payload: &DiffPayload, stamp: i64) -> Result<()> {
    match payload {
        DiffPayload::Fields { section, changes } => {
            revert_fields(conn, page_id, *section, changes, stamp)
        }
        DiffPayload::Collection { collection, diff } => {
            revert_collection(conn, page_id, *collection, diff)
        }
        DiffPayload::Swap {
            collection, old, ..
        } => {
            PageRepo::delete_collection(conn, page_id, *collection)?;
            let rows: Vec<Value> = old.iter().map(strip_id).collect();
            PageRepo::create_rows(conn, page_id, *collection, &rows)?;
            Ok(())
        }
        DiffPayload::Values {
            collection,
            added,
            removed,
        } => revert_values(conn, page_id, *collection, added, removed),
    }
}

fn revert_fields(
    conn: &Connection,
    page_id: &str,
    section: Section,
    changes: &FieldDiff,
    stamp: i64,
) -> Result<()> {
    let page = PageRepo::get_page(conn, page_id)?
        .ok_or_else(|| not_found("restore_to_log_entry", "page", page_id))?;
    let mut values = match section {
        Section::Settings => page.settings,
        Section::Status => page.status,
    };
    for (field, change) in changes {
        restore_field(&mut values, field, &change.old);
    }
    PageRepo::update_section(conn, page_id, section, &values, stamp)
}

/// Set a field back to its old value. An old `null` means the field was
/// absent.
fn restore_field(values: &mut Map<String, Value>, field: &str, old: &Value) {
    if old.is_null() {
        values.remove(field);
    } else {
        values.insert(field.to_string(), old.clone());
    }
}

fn revert_collection(
    conn: &Connection,
    page_id: &str,
    kind: CollectionKind,
    diff: &CollectionDiff,
) -> Result<()> {
    let added: Vec<i64> = diff.added.iter().filter_map(row_id).collect();
    PageRepo::delete_rows(conn, page_id, kind, &added)?;

    let current: HashMap<i64, Value> = PageRepo::load_collection(conn, page_id, kind)?
        .into_iter()
        .filter_map(|row| Some((row_id(&row)?, row)))
        .collect();
    let mut updates = Vec::with_capacity(diff.updated.len());
    for updated in &diff.updated {
        let Some((id, mut row)) = updated
            .id
            .as_i64()
            .and_then(|id| Some((id, current.get(&id)?.clone())))
        else {
            tracing::debug!(page_id = page_id, "Updated row no longer exists; skipping");
            continue;
        };
        if let Some(fields) = row.as_object_mut() {
            for (field, change) in &updated.changes {
                restore_field(fields, field, &change.old);
            }
        }
        updates.push((id, row));
    }
    PageRepo::update_rows(conn, page_id, kind, &updates)?;

    let mut survivors: Vec<i64> = PageRepo::list_rows(conn, page_id, kind)?
        .into_iter()
        .map(|row| row.id)
        .collect();
    if diff.reordered {
        let previous: Vec<Option<i64>> = diff.previous_order.iter().map(Value::as_i64).collect();
        survivors.sort_by_key(|id| {
            previous
                .iter()
                .position(|p| *p == Some(*id))
                .unwrap_or(usize::MAX)
        });
    }

    let mut recreated = Vec::with_capacity(diff.removed.len());
    for element in &diff.removed {
        let id = match row_id(element) {
            Some(id) => reinstate_row(conn, page_id, kind, id, element)?,
            None => PageRepo::create_row(conn, page_id, kind, &strip_id(element))?,
        };
        let position = element
            .get(POSITION_KEY)
            .and_then(Value::as_u64)
            .and_then(|p| usize::try_from(p).ok());
        recreated.push((id, position));
    }

    survivors.retain(|id| !recreated.iter().any(|(r, _)| r == id));
    let order = interleave(survivors, recreated);
    write_positions(conn, page_id, kind, &order)
}

/// Put a removed row back under its original id. A row that already holds
/// the id in this collection (an earlier undo brought it back) is
/// overwritten in place; only an id taken elsewhere gets a fresh row.
fn reinstate_row(
    conn: &Connection,
    page_id: &str,
    kind: CollectionKind,
    id: i64,
    element: &Value,
) -> Result<i64> {
    if PageRepo::create_row_with_id(conn, page_id, kind, id, element)?
        || PageRepo::update_row(conn, page_id, kind, id, element)?
    {
        return Ok(id);
    }
    PageRepo::create_row(conn, page_id, kind, &strip_id(element))
}

/// Final row order: recreated rows go back to their old positions, survivors
/// fill the remaining slots in order.
fn interleave(survivors: Vec<i64>, recreated: Vec<(i64, Option<usize>)>) -> Vec<i64> {
    let total = survivors.len() + recreated.len();
    let mut slots: Vec<Option<i64>> = vec![None; total];
    let mut displaced = Vec::new();
    for (id, position) in recreated {
        match position.filter(|p| *p < total && slots[*p].is_none()) {
            Some(p) => slots[p] = Some(id),
            None => displaced.push(id),
        }
    }

    let mut rest = survivors.into_iter().chain(displaced);
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| rest.next()))
        .collect()
}

fn write_positions(
    conn: &Connection,
    page_id: &str,
    kind: CollectionKind,
    order: &[i64],
) -> Result<()> {
    let mut bodies: HashMap<i64, Value> = PageRepo::list_rows(conn, page_id, kind)?
        .into_iter()
        .map(|row| (row.id, row.body))
        .collect();
    let mut moved = Vec::new();
    for (index, id) in order.iter().enumerate() {
        let Some(mut body) = bodies.remove(id) else {
            continue;
        };
        if body.get(POSITION_KEY) == Some(&json!(index)) {
            continue;
        }
        if let Some(fields) = body.as_object_mut() {
            fields.insert(POSITION_KEY.to_string(), json!(index));
        }
        moved.push((*id, body));
    }
    PageRepo::update_rows(conn, page_id, kind, &moved)?;
    Ok(())
}

fn revert_values(
    conn: &Connection,
    page_id: &str,
    kind: CollectionKind,
    added: &[Value],
    removed: &[Value],
) -> Result<()> {
    PageRepo::delete_values(conn, page_id, kind, added)?;
    let present = PageRepo::load_collection(conn, page_id, kind)?;
    let missing: Vec<Value> = removed
        .iter()
        .filter(|value| !present.iter().any(|p| deep_equal(p, value)))
        .cloned()
        .collect();
    PageRepo::create_rows(conn, page_id, kind, &missing)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_puts_recreated_rows_back() {
        // old [10, 11, 12], 11 was removed
        let order = interleave(vec![10, 12], vec![(11, Some(1))]);
        assert_eq!(order, vec![10, 11, 12]);
    }

    #[test]
    fn test_interleave_appends_rows_without_a_free_slot() {
        let order = interleave(vec![1, 2], vec![(3, Some(9)), (4, None)]);
        assert_eq!(order, vec![1, 2, 3, 4]);

        let order = interleave(vec![1], vec![(2, Some(0)), (3, Some(0))]);
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn test_restore_field_null_removes() {
        let mut values = json!({"title": "B", "bio": "new"})
            .as_object()
            .unwrap()
            .clone();
        restore_field(&mut values, "bio", &Value::Null);
        restore_field(&mut values, "title", &json!("A"));
        assert_eq!(Value::Object(values), json!({"title": "A"}));
    }
}
