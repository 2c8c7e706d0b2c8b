//! Restore by copying a stored version over the page.
//!
//! Rows of identified collections are recreated under new ids. Collections
//! are visited in [`CollectionKind::ALL`] order, so every referenced
//! collection is rebuilt before the collections pointing into it, and their
//! reference fields are translated through the old-id to new-id map. A
//! reference that cannot be resolved becomes `null`.

#![allow(clippy::result_large_err)]

use crate::commands::access::load_owned_page;
use crate::commands::recorder;
use crate::commands::restore::{RestoreOutcome, RestoreStrategy};
use crate::commands::EngineContext;
use pagetrail_core::diff::element_id;
use pagetrail_core::model::{
    ActionKind, CollectionKind, NewAuditEntry, Reference, Section, Subject, Verb, ID_KEY,
};
use pagetrail_core_types::ActorContext;
use pagetrail_store::errors::Result;
use pagetrail_store::repo::PageRepo;
use pagetrail_store::versions::get_version;
use rusqlite::{Connection, Transaction};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

/// Old row id (as a map key) to the id of the row recreated from it.
type IdMap = HashMap<String, i64>;

/// Replace a page's state with one of its stored versions.
#[derive(Debug, Clone)]
pub struct SnapshotReplace {
    page_id: String,
    version_id: String,
}

impl SnapshotReplace {
    pub fn new(page_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            version_id: version_id.into(),
        }
    }
}

impl RestoreStrategy for SnapshotReplace {
    fn name(&self) -> &'static str {
        "restore_from_version"
    }

    fn apply(
        &self,
        tx: &Transaction<'_>,
        ctx: EngineContext<'_>,
        actor: &ActorContext,
    ) -> Result<RestoreOutcome> {
        load_owned_page(tx, &self.page_id, actor)?;
        let version = get_version(tx, &self.page_id, &self.version_id)?;
        let document = version.document;

        let now = ctx.clock.now();
        let stamp = now.timestamp_millis();
        PageRepo::update_section(tx, &self.page_id, Section::Settings, &document.settings, stamp)?;
        PageRepo::update_section(tx, &self.page_id, Section::Status, &document.status, stamp)?;
        let rows_restored = replace_collections(tx, &self.page_id, &document.collections)?;

        tracing::debug!(
            page_id = self.page_id.as_str(),
            version_id = self.version_id.as_str(),
            rows_restored = rows_restored,
            "Replaced page state from version"
        );

        let entry = NewAuditEntry::without_diff(
            &actor.actor_id,
            ActionKind::new(Subject::Version, Verb::Restore),
            &self.page_id,
            json!({
                "version_id": self.version_id,
                "label": version.summary.label,
            }),
        );
        let log_entry = recorder::record(tx, &entry, now);

        Ok(RestoreOutcome {
            page_id: self.page_id.clone(),
            reverted_count: 0,
            rows_restored,
            log_entry,
        })
    }
}

/// Wipe and recreate every collection; returns the number of rows written.
fn replace_collections(
    conn: &Connection,
    page_id: &str,
    collections: &BTreeMap<CollectionKind, Vec<Value>>,
) -> Result<usize> {
    let mut id_maps: HashMap<CollectionKind, IdMap> = HashMap::new();
    let mut written = 0;

    for kind in CollectionKind::ALL {
        PageRepo::delete_collection(conn, page_id, kind)?;

        let captured = collections.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        let rows: Vec<Value> = match kind.reference() {
            Some(reference) => captured
                .iter()
                .map(|row| remap_reference(row, reference, id_maps.get(&reference.target)))
                .collect(),
            None => captured.to_vec(),
        };
        let new_ids = PageRepo::create_rows(conn, page_id, kind, &rows)?;

        if kind.is_referenced() {
            let map: IdMap = rows
                .iter()
                .zip(&new_ids)
                .filter_map(|(row, new_id)| Some((element_id(row, ID_KEY)?, *new_id)))
                .collect();
            id_maps.insert(kind, map);
        }
        written += new_ids.len();
    }
    Ok(written)
}

/// Translate `reference.field` through `ids`. Absent or `null` references
/// are left alone; anything that does not resolve becomes `null`.
fn remap_reference(row: &Value, reference: Reference, ids: Option<&IdMap>) -> Value {
    let mut row = row.clone();
    let Some(fields) = row.as_object_mut() else {
        return row;
    };
    let Some(old) = fields.get(reference.field).filter(|v| !v.is_null()) else {
        return row;
    };
    let new = reference_key(old)
        .and_then(|key| ids?.get(&key).copied())
        .map(Value::from)
        .unwrap_or(Value::Null);
    fields.insert(reference.field.to_string(), new);
    row
}

fn reference_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
