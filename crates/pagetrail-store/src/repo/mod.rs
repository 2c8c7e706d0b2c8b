//! Repository layer for pages and their child collections

pub mod page_repo;

pub use page_repo::{row_id, PageRecord, PageRepo, StoredRow};
