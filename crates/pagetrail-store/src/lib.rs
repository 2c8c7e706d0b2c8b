//! pagetrail store - SQLite persistence for pages and their history
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - Page and child-collection repository
//! - Audit log append and queries
//! - Version capture with coalescing and per-kind FIFO retention

pub mod audit;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod versions;

pub use errors::Result;
