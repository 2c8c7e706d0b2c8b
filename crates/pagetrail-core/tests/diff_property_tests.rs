//! Property tests for the equality kernel and diff engine.

use pagetrail_core::diff::{diff_collection, diff_fields, element_id};
use pagetrail_core::equality::deep_equal;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn record() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-e]", scalar(), 0..5)
        .prop_map(|m| m.into_iter().collect::<Map<String, Value>>())
}

/// Collections with unique ids drawn from 0..8 and a single `name` field.
fn collection() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::btree_set(0u32..8, 0..6)
        .prop_flat_map(|ids| {
            let ids: Vec<u32> = ids.into_iter().collect();
            let len = ids.len();
            (
                Just(ids).prop_shuffle(),
                prop::collection::vec("[a-c]", len..=len),
            )
        })
        .prop_map(|(ids, names)| {
            ids.into_iter()
                .zip(names)
                .map(|(id, name)| json!({"id": id, "name": name}))
                .collect()
        })
}

fn ids(elements: &[Value]) -> Vec<String> {
    elements.iter().filter_map(|e| element_id(e, "id")).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn equal_records_have_empty_field_diff(a in record()) {
        let b = a.clone();
        prop_assert!(deep_equal(&Value::Object(a.clone()), &Value::Object(b.clone())));
        prop_assert!(diff_fields(&a, &b, &[]).is_empty());
    }

    #[test]
    fn field_diff_reports_exactly_unequal_keys(a in record(), b in record()) {
        let diff = diff_fields(&a, &b, &[]);
        for (key, change) in &diff {
            prop_assert!(!deep_equal(&change.old, &change.new), "key {} reported equal", key);
        }
        for key in a.keys().chain(b.keys()) {
            let old = a.get(key).unwrap_or(&Value::Null);
            let new = b.get(key).unwrap_or(&Value::Null);
            prop_assert_eq!(diff.contains_key(key), !deep_equal(old, new));
        }
    }

    #[test]
    fn collection_diff_partitions_ids(old in collection(), new in collection()) {
        let diff = diff_collection(&old, &new, "id", &[]);
        let old_ids: HashSet<String> = ids(&old).into_iter().collect();
        let new_ids: HashSet<String> = ids(&new).into_iter().collect();

        let removed: HashSet<String> = ids(&diff.removed).into_iter().collect();
        let added: HashSet<String> = ids(&diff.added).into_iter().collect();
        let surviving: HashSet<String> = old_ids.intersection(&new_ids).cloned().collect();

        let expected_removed: HashSet<String> = old_ids.difference(&new_ids).cloned().collect();
        let expected_added: HashSet<String> = new_ids.difference(&old_ids).cloned().collect();
        prop_assert_eq!(&removed, &expected_removed);
        prop_assert_eq!(&added, &expected_added);
        prop_assert!(removed.is_disjoint(&surviving));
        prop_assert!(added.is_disjoint(&surviving));
        for updated in &diff.updated {
            prop_assert!(surviving.contains(&updated.id.to_string()));
        }
    }

    #[test]
    fn same_elements_shuffled_only_reorder(old in collection()) {
        let mut new = old.clone();
        new.reverse();
        let diff = diff_collection(&old, &new, "id", &[]);
        prop_assert!(diff.added.is_empty());
        prop_assert!(diff.removed.is_empty());
        prop_assert!(diff.updated.is_empty());
        prop_assert_eq!(diff.reordered, old.len() > 1);
    }

    #[test]
    fn self_diff_is_empty(old in collection()) {
        prop_assert!(diff_collection(&old, &old, "id", &[]).is_empty());
    }
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_collection_diff_concrete_example() {
    let old = vec![json!({"id": 1, "name": "A"}), json!({"id": 2, "name": "B"})];
    let new = vec![json!({"id": 2, "name": "B2"}), json!({"id": 3, "name": "C"})];
    let diff = diff_collection(&old, &new, "id", &[]);

    assert_eq!(diff.added, vec![json!({"id": 3, "name": "C"})]);
    assert_eq!(diff.removed, vec![json!({"id": 1, "name": "A"})]);
    assert_eq!(diff.updated.len(), 1);
    assert_eq!(diff.updated[0].id, json!(2));
    assert_eq!(diff.updated[0].changes["name"].old, json!("B"));
    assert_eq!(diff.updated[0].changes["name"].new, json!("B2"));
    assert!(!diff.reordered);
}

#[test]
fn test_pure_reorder() {
    let old = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
    let new = vec![json!({"id": 3}), json!({"id": 1}), json!({"id": 2})];
    let diff = diff_collection(&old, &new, "id", &[]);

    assert!(diff.reordered);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert!(diff.updated.is_empty());
}

#[test]
fn test_ignored_fields_do_not_count_as_updates() {
    let old = vec![json!({"id": 1, "name": "A", "updated_at": "2024-01-01T00:00:00Z"})];
    let new = vec![json!({"id": 1, "name": "A", "updated_at": "2024-06-01T00:00:00Z"})];
    assert!(diff_collection(&old, &new, "id", &["updated_at"]).is_empty());
}
