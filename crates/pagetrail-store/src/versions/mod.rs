//! Page version persistence.
//!
//! ## Responsibilities
//!
//! - Capture versions, coalescing rapid automatic captures into the newest
//!   automatic version
//! - Evict the oldest versions of a kind beyond its quota
//! - List versions and load one with digest verification
//!
//! ## Non-Responsibilities
//!
//! - Document schema, digests and retention policy (handled by `pagetrail-core`)
//! - Tier resolution and restore orchestration (handled by `pagetrail-engine`)

pub mod persist;
pub mod query;

pub use persist::{capture_version, CaptureRequest, CaptureResult};
pub use query::{get_version, latest_auto_version, list_versions, Version, VersionSummary};
