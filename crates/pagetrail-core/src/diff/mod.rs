//! Structural diff engine.
//!
//! Compares two states of page data and produces diffs that are both stored
//! on audit entries and replayed in reverse by undo.
//!
//! ## Entry points
//!
//! ```ignore
//! use pagetrail_core::diff::{diff_collection, diff_fields};
//!
//! let changes = diff_fields(&old_settings, &new_settings, &["updated_at"]);
//! let links = diff_collection(&old_links, &new_links, "id", &["updated_at"]);
//! ```
//!
//! ## Guarantees
//!
//! - **Field level only**: nested objects and arrays are reported as one whole
//!   old/new pair, never recursed into.
//! - **Determinism**: field diffs are keyed by `BTreeMap`, so the serialized
//!   payload is stable for identical inputs.
//! - **Order-only reordering**: elements that were only added or only removed
//!   never make a collection count as reordered.

pub mod engine;
pub mod model;
pub mod summary;

pub use engine::{diff_collection, diff_fields, diff_values, element_id};
pub use model::{
    CollectionDiff, DiffPayload, FieldChange, FieldDiff, UpdatedElement, ValueSetDiff,
};
pub use summary::{summarize, Summary};
