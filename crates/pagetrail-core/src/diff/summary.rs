//! Human-readable summaries for audit entries and version change lists.

use serde_json::Value;

use crate::diff::model::{CollectionDiff, DiffPayload, FieldDiff, UpdatedElement};
use crate::model::{ActionKind, CollectionKind, Verb};

/// Rendered values longer than this are cut with an ellipsis.
const MAX_VALUE_CHARS: usize = 60;

/// Fields tried, in order, when naming a collection element.
const LABEL_FIELDS: [&str; 4] = ["title", "name", "label", "platform"];

/// One-line summary plus per-change lines for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    pub summary: String,
    pub changes: Vec<String>,
}

/// Summarize an action and its diff.
///
/// The summary line is the action phrase followed by the first
/// `field_limit` changed field names (or per-collection counts) and an
/// "and N more" tail for the rest.
pub fn summarize(action: &ActionKind, payload: &DiffPayload, field_limit: usize) -> Summary {
    let phrase = action.phrase();
    match payload {
        DiffPayload::Fields { changes, .. } => Summary {
            summary: with_detail(&phrase, name_list(changes.keys(), field_limit)),
            changes: field_lines(changes),
        },
        DiffPayload::Collection { collection, diff } => Summary {
            summary: with_detail(&phrase, collection_counts(diff, !is_reorder(action))),
            changes: collection_lines(*collection, diff),
        },
        DiffPayload::Swap {
            collection,
            old,
            new,
        } => Summary {
            summary: phrase,
            changes: vec![format!(
                "replaced {} ({} → {})",
                collection.plural(),
                old.len(),
                new.len()
            )],
        },
        DiffPayload::Values {
            collection,
            added,
            removed,
        } => {
            let mut changes = Vec::with_capacity(added.len() + removed.len());
            for value in added {
                changes.push(format!("added {} {}", collection.singular(), render(value)));
            }
            for value in removed {
                changes.push(format!(
                    "removed {} {}",
                    collection.singular(),
                    render(value)
                ));
            }
            let detail = counts(&[("added", added.len()), ("removed", removed.len())]);
            Summary {
                summary: with_detail(&phrase, detail),
                changes,
            }
        }
    }
}

fn with_detail(phrase: &str, detail: String) -> String {
    if detail.is_empty() {
        phrase.to_string()
    } else {
        format!("{}: {}", phrase, detail)
    }
}

fn name_list<'a>(names: impl ExactSizeIterator<Item = &'a String>, limit: usize) -> String {
    let limit = limit.max(1);
    let total = names.len();
    let shown: Vec<&str> = names.take(limit).map(String::as_str).collect();
    let mut out = shown.join(", ");
    if total > limit {
        out.push_str(&format!(" and {} more", total - limit));
    }
    out
}

fn counts(parts: &[(&str, usize)]) -> String {
    parts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| format!("{} {}", n, label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_reorder(action: &ActionKind) -> bool {
    matches!(
        action,
        ActionKind::Standard {
            verb: Verb::Reorder,
            ..
        }
    )
}

fn collection_counts(diff: &CollectionDiff, mention_reorder: bool) -> String {
    let mut detail = counts(&[
        ("added", diff.added.len()),
        ("removed", diff.removed.len()),
        ("updated", diff.updated.len()),
    ]);
    if diff.reordered && mention_reorder {
        if !detail.is_empty() {
            detail.push_str(", ");
        }
        detail.push_str("reordered");
    }
    detail
}

fn field_lines(changes: &FieldDiff) -> Vec<String> {
    changes
        .iter()
        .map(|(field, change)| {
            format!("{}: {} → {}", field, render(&change.old), render(&change.new))
        })
        .collect()
}

fn collection_lines(kind: CollectionKind, diff: &CollectionDiff) -> Vec<String> {
    let mut lines = Vec::new();
    for element in &diff.added {
        lines.push(format!("added {} {}", kind.singular(), element_label(element)));
    }
    for element in &diff.removed {
        lines.push(format!("removed {} {}", kind.singular(), element_label(element)));
    }
    for UpdatedElement { id, changes } in &diff.updated {
        let fields: Vec<&str> = changes.keys().map(String::as_str).collect();
        lines.push(format!(
            "updated {} {}: {}",
            kind.singular(),
            render(id),
            fields.join(", ")
        ));
    }
    if diff.reordered {
        lines.push(format!("reordered {}", kind.plural()));
    }
    lines
}

fn element_label(element: &Value) -> String {
    LABEL_FIELDS
        .iter()
        .find_map(|field| element.get(*field).and_then(Value::as_str))
        .map(|s| format!("\"{}\"", truncate(s)))
        .or_else(|| element.get("id").map(render))
        .unwrap_or_else(|| render(element))
}

fn render(value: &Value) -> String {
    truncate(&value.to_string())
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_VALUE_CHARS {
        return s.to_string();
    }
    let cut: String = s.chars().take(MAX_VALUE_CHARS).collect();
    format!("{}…", cut)
}
