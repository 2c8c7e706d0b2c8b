//! Version snapshots.
//!
//! ## Responsibilities
//!
//! - Define the self-describing version document and its format tag
//! - Compute and verify document digests
//! - Decide coalescing and retention for captures
//!
//! ## Non-Responsibilities
//!
//! - Persistence (handled by `pagetrail-store`)
//! - Orchestration (handled by `pagetrail-engine`)

pub mod digest;
pub mod document;
pub mod retention;

pub use digest::{compute_document_digest, verify_document_digest};
pub use document::{VersionDocument, VersionMeta, FORMAT_VERSION};
pub use retention::{decide_capture, excess, CaptureDecision, VersionKind};
