//! pagetrail core - pure version-history kernel
//!
//! This crate holds everything about page history that does not touch storage:
//! - Deep structural equality with the temporal-string rule
//! - Field-level and collection-level diffs plus their human summaries
//! - The page data model (collections, page state, action kinds, audit entries)
//! - Version documents, their digests, and retention/coalescing policy
//! - Configuration, the clock seam, and the logging facility
//!
//! Persistence lives in `pagetrail-store`; orchestration in `pagetrail-engine`.

pub mod clock;
pub mod config;
pub mod diff;
pub mod equality;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod snapshot;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::HistoryConfig;
pub use equality::deep_equal;
pub use errors::{ExError, ExErrorKind, HistoryError, Result};
pub use model::{ActionCategory, ActionKind, CollectionKind, PageState};
