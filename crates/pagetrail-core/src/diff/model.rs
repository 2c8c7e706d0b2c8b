//! Diff output types.
//!
//! Maps use `BTreeMap` so serialized payloads are deterministic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::equality::deep_equal;
use crate::model::{CollectionKind, Section};

/// Old/new values for a changed field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Field name to old/new pair, covering only fields whose values differ.
pub type FieldDiff = BTreeMap<String, FieldChange>;

/// An element present on both sides whose fields changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdatedElement {
    pub id: Value,
    pub changes: FieldDiff,
}

/// Set-reconciliation diff between two collections of identified elements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CollectionDiff {
    /// Elements of the new collection whose id was not in the old one
    pub added: Vec<Value>,
    /// Elements of the old collection whose id is not in the new one
    pub removed: Vec<Value>,
    /// Surviving elements with at least one changed field
    pub updated: Vec<UpdatedElement>,
    /// True iff the surviving ids appear in a different relative order
    pub reordered: bool,
    /// Surviving ids in their old relative order; populated only when `reordered`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_order: Vec<Value>,
}

impl CollectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && !self.reordered
    }
}

/// Added/removed diff for collections of bare values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ValueSetDiff {
    pub added: Vec<Value>,
    pub removed: Vec<Value>,
}

impl ValueSetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Diff stored on an audit log entry. Each shape names the part of the page it
/// applies to, so undo can dispatch without inspecting the action tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DiffPayload {
    /// Field-level diff on a singleton section
    Fields {
        section: Section,
        changes: FieldDiff,
    },
    /// Identified-element diff on an ordered collection
    Collection {
        collection: CollectionKind,
        diff: CollectionDiff,
    },
    /// Whole-collection replacement for collections without stable ids
    Swap {
        collection: CollectionKind,
        old: Vec<Value>,
        new: Vec<Value>,
    },
    /// Value-set diff for scalar collections
    Values {
        collection: CollectionKind,
        added: Vec<Value>,
        removed: Vec<Value>,
    },
}

impl DiffPayload {
    pub fn is_empty(&self) -> bool {
        match self {
            DiffPayload::Fields { changes, .. } => changes.is_empty(),
            DiffPayload::Collection { diff, .. } => diff.is_empty(),
            DiffPayload::Swap { old, new, .. } => {
                deep_equal(&Value::Array(old.clone()), &Value::Array(new.clone()))
            }
            DiffPayload::Values { added, removed, .. } => added.is_empty() && removed.is_empty(),
        }
    }

    pub fn collection(&self) -> Option<CollectionKind> {
        match self {
            DiffPayload::Fields { .. } => None,
            DiffPayload::Collection { collection, .. }
            | DiffPayload::Swap { collection, .. }
            | DiffPayload::Values { collection, .. } => Some(*collection),
        }
    }
}
