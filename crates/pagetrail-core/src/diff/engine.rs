//! Diff computation.
//!
//! [`diff_fields`] compares two flat records, [`diff_collection`] reconciles
//! two identified collections, and [`diff_values`] compares two value sets.

use serde_json::{Map, Number, Value};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::diff::model::{CollectionDiff, FieldChange, FieldDiff, UpdatedElement, ValueSetDiff};
use crate::equality::{as_integer, deep_equal};

/// Compute a field-level diff between two flat records.
///
/// Iterates the union of keys, skips `ignored`, and reports a key unless its
/// two values are [`deep_equal`]. A key missing on one side is reported with
/// `null` on that side. Nested values are reported whole, never recursed into.
pub fn diff_fields(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    ignored: &[&str],
) -> FieldDiff {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut diff = FieldDiff::new();
    for key in keys {
        if ignored.contains(&key.as_str()) {
            continue;
        }
        let old_val = old.get(key).unwrap_or(&Value::Null);
        let new_val = new.get(key).unwrap_or(&Value::Null);
        if !deep_equal(old_val, new_val) {
            diff.insert(
                key.clone(),
                FieldChange {
                    old: old_val.clone(),
                    new: new_val.clone(),
                },
            );
        }
    }
    diff
}

/// Map key for an element id. Strings and numbers identify; anything else
/// (missing, null, nested) does not. Numbers with an integral value map to
/// the same key however they are encoded, so `1` and `1.0` match.
pub fn element_id(element: &Value, id_key: &str) -> Option<String> {
    match element.get(id_key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_key(n)),
        _ => None,
    }
}

fn number_key(n: &Number) -> String {
    if let Some(i) = as_integer(n) {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Reconcile two collections of identified elements.
///
/// Elements without an id are always `added` (new side) or `removed` (old
/// side) and never count towards reordering. Reordering compares only ids
/// present on both sides.
pub fn diff_collection(
    old: &[Value],
    new: &[Value],
    id_key: &str,
    ignored: &[&str],
) -> CollectionDiff {
    let mut old_by_id: HashMap<String, &Value> = HashMap::new();
    for element in old {
        if let Some(id) = element_id(element, id_key) {
            old_by_id.entry(id).or_insert(element);
        }
    }
    let new_ids: HashSet<String> = new.iter().filter_map(|e| element_id(e, id_key)).collect();

    let empty = Map::new();
    let mut diff = CollectionDiff::default();

    for element in new {
        match element_id(element, id_key) {
            Some(id) if old_by_id.contains_key(&id) => {
                let changes = diff_fields(
                    old_by_id[&id].as_object().unwrap_or(&empty),
                    element.as_object().unwrap_or(&empty),
                    ignored,
                );
                if !changes.is_empty() {
                    diff.updated.push(UpdatedElement {
                        id: element.get(id_key).cloned().unwrap_or(Value::Null),
                        changes,
                    });
                }
            }
            _ => diff.added.push(element.clone()),
        }
    }

    for element in old {
        let survives = element_id(element, id_key).is_some_and(|id| new_ids.contains(&id));
        if !survives {
            diff.removed.push(element.clone());
        }
    }

    let old_sequence: Vec<String> = old
        .iter()
        .filter_map(|e| element_id(e, id_key))
        .filter(|id| new_ids.contains(id))
        .collect();
    let new_sequence: Vec<String> = new
        .iter()
        .filter_map(|e| element_id(e, id_key))
        .filter(|id| old_by_id.contains_key(id))
        .collect();

    if old_sequence != new_sequence {
        diff.reordered = true;
        diff.previous_order = old
            .iter()
            .filter(|e| element_id(e, id_key).is_some_and(|id| new_ids.contains(&id)))
            .filter_map(|e| e.get(id_key).cloned())
            .collect();
    }

    diff
}

/// Diff two collections of bare values as sets.
pub fn diff_values(old: &[Value], new: &[Value]) -> ValueSetDiff {
    fn contains(haystack: &[Value], needle: &Value) -> bool {
        haystack.iter().any(|v| deep_equal(v, needle))
    }
    ValueSetDiff {
        added: new.iter().filter(|v| !contains(old, v)).cloned().collect(),
        removed: old.iter().filter(|v| !contains(new, v)).cloned().collect(),
    }
}
