//! Audit log persistence.
//!
//! ## Responsibilities
//!
//! - Append immutable entries, assigning id, sequence and timestamp
//! - Query entries by id, by target, and "strictly after" a given entry
//!
//! ## Non-Responsibilities
//!
//! - Building entries and summaries (handled by `pagetrail-core`)
//! - The swallow-and-log failure policy (handled by `pagetrail-engine`)

pub mod persist;
pub mod query;

pub use persist::append_entry;
pub use query::{get_entry, list_after, list_for_target, HistoryQuery};
