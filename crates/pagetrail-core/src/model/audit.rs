//! Audit log entries.
//!
//! Entries are built here as pure values and appended by the store. An entry
//! is never mutated after it is written.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::action::{ActionCategory, ActionKind};
use super::page::Section;
use crate::diff::{diff_fields, summarize, DiffPayload};

/// A stored audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// UUIDv7
    pub id: String,
    /// Insertion sequence; breaks ties between entries with equal timestamps
    pub seq: i64,
    pub actor_id: String,
    pub action: ActionKind,
    pub category: ActionCategory,
    /// Page the action targeted
    pub target_id: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub diff: Option<DiffPayload>,
    pub summary: String,
    pub changes: Vec<String>,
    pub metadata: Value,
}

/// An entry ready to append. Id, sequence and timestamp are assigned on write.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub actor_id: String,
    pub action: ActionKind,
    pub category: ActionCategory,
    pub target_id: String,
    pub diff: Option<DiffPayload>,
    pub summary: String,
    pub changes: Vec<String>,
    pub metadata: Value,
}

impl NewAuditEntry {
    /// Build an entry carrying a diff. Returns `None` when the diff is empty,
    /// so idempotent writes leave no trace.
    pub fn for_diff(
        actor_id: &str,
        action: ActionKind,
        target_id: &str,
        payload: DiffPayload,
        metadata: Value,
        field_limit: usize,
    ) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }
        let summary = summarize(&action, &payload, field_limit);
        Some(Self {
            actor_id: actor_id.to_string(),
            category: action.category(),
            action,
            target_id: target_id.to_string(),
            diff: Some(payload),
            summary: summary.summary,
            changes: summary.changes,
            metadata,
        })
    }

    /// Build an entry for an action that has no diff of its own, such as a
    /// restore or a backup.
    pub fn without_diff(
        actor_id: &str,
        action: ActionKind,
        target_id: &str,
        metadata: Value,
    ) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            category: action.category(),
            summary: action.phrase(),
            action,
            target_id: target_id.to_string(),
            diff: None,
            changes: Vec::new(),
            metadata,
        }
    }
}

/// Diff two versions of a singleton section and build the entry recording it.
///
/// Returns `None` when nothing outside `ignored` changed.
#[allow(clippy::too_many_arguments)]
pub fn prepare_field_entry(
    actor_id: &str,
    action: ActionKind,
    target_id: &str,
    section: Section,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    ignored: &[&str],
    extra: Value,
    field_limit: usize,
) -> Option<NewAuditEntry> {
    let changes = diff_fields(old, new, ignored);
    NewAuditEntry::for_diff(
        actor_id,
        action,
        target_id,
        DiffPayload::Fields { section, changes },
        extra,
        field_limit,
    )
}
