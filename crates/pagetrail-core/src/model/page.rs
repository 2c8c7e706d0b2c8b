use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::collection::CollectionKind;

/// Singleton sub-objects of a page that are diffed field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Settings,
    Status,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Settings => "settings",
            Section::Status => "status",
        }
    }
}

/// Full state of one page: the versioned aggregate.
///
/// Ordered rows are JSON objects carrying `id` and `position`; unordered rows
/// are objects without ids; value-set rows are bare scalars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageState {
    pub settings: Map<String, Value>,
    pub status: Map<String, Value>,
    pub collections: BTreeMap<CollectionKind, Vec<Value>>,
}

impl PageState {
    /// Rows of one collection; empty when the page has none.
    pub fn collection(&self, kind: CollectionKind) -> &[Value] {
        self.collections
            .get(&kind)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn section(&self, section: Section) -> &Map<String, Value> {
        match section {
            Section::Settings => &self.settings,
            Section::Status => &self.status,
        }
    }

    /// Total number of child rows across all collections.
    pub fn row_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_collection_is_empty() {
        let state = PageState::default();
        assert!(state.collection(CollectionKind::Links).is_empty());
        assert_eq!(state.row_count(), 0);
    }

    #[test]
    fn test_row_count_spans_collections() {
        let mut state = PageState::default();
        state
            .collections
            .insert(CollectionKind::Links, vec![json!({"id": 1}), json!({"id": 2})]);
        state
            .collections
            .insert(CollectionKind::AccentColors, vec![json!("#fff")]);
        assert_eq!(state.row_count(), 3);
    }
}
