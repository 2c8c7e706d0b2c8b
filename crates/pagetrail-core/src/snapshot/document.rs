//! Version document schema.
//!
//! A document is the full, self-contained copy of a page captured by a
//! version:
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "settings": { ... },
//!   "status": { ... },
//!   "collections": { "links": [ ... ], "accent_colors": [ ... ], ... },
//!   "meta": { "captured_at": "...", "changes": [ ... ] }
//! }
//! ```
//!
//! Documents written by an unknown format, or missing any top-level section,
//! are rejected as corrupted rather than restored into a wrong shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::{HistoryError, Result};
use crate::model::{CollectionKind, PageState};

/// Format tag written into every document.
pub const FORMAT_VERSION: u32 = 1;

const REQUIRED_SECTIONS: [&str; 4] = ["settings", "status", "collections", "meta"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMeta {
    pub captured_at: DateTime<Utc>,
    /// Change summaries that led to this version, oldest first
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDocument {
    pub format_version: u32,
    pub settings: Map<String, Value>,
    pub status: Map<String, Value>,
    pub collections: BTreeMap<CollectionKind, Vec<Value>>,
    pub meta: VersionMeta,
}

impl VersionDocument {
    /// Capture a page state. Every known collection is written, empty or not.
    pub fn from_state(
        state: &PageState,
        captured_at: DateTime<Utc>,
        changes: Vec<String>,
    ) -> Self {
        let collections = CollectionKind::ALL
            .into_iter()
            .map(|kind| (kind, state.collection(kind).to_vec()))
            .collect();
        Self {
            format_version: FORMAT_VERSION,
            settings: state.settings.clone(),
            status: state.status.clone(),
            collections,
            meta: VersionMeta {
                captured_at,
                changes,
            },
        }
    }

    /// Parse a stored document.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::CorruptedSnapshot` if the text is not a JSON
    /// object, a top-level section is missing, the format is unknown, or a
    /// section has the wrong shape.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text).map_err(|e| corrupted(e.to_string()))?;
        let obj = raw
            .as_object()
            .ok_or_else(|| corrupted("document is not an object"))?;

        for section in REQUIRED_SECTIONS {
            if !obj.contains_key(section) {
                return Err(corrupted(format!("missing section '{}'", section)));
            }
        }
        match obj.get("format_version").and_then(Value::as_u64) {
            Some(v) if v == u64::from(FORMAT_VERSION) => {}
            Some(v) => return Err(corrupted(format!("unknown format_version {}", v))),
            None => return Err(corrupted("missing format_version")),
        }

        serde_json::from_value(raw).map_err(|e| corrupted(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Page state held by this document.
    pub fn to_state(&self) -> PageState {
        PageState {
            settings: self.settings.clone(),
            status: self.status.clone(),
            collections: self.collections.clone(),
        }
    }
}

fn corrupted(reason: impl Into<String>) -> HistoryError {
    HistoryError::CorruptedSnapshot {
        reason: reason.into(),
    }
}
