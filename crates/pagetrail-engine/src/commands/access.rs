//! Ownership checks.

#![allow(clippy::result_large_err)]

use pagetrail_core::errors::{ExError, ExErrorKind};
use pagetrail_core_types::ActorContext;
use pagetrail_store::errors::{not_found, Result};
use pagetrail_store::repo::{PageRecord, PageRepo};
use rusqlite::Connection;

/// Load a page the actor owns.
///
/// # Errors
///
/// - `NotFound`: no such page
/// - `Unauthorized`: the page belongs to someone else
pub fn load_owned_page(
    conn: &Connection,
    page_id: &str,
    actor: &ActorContext,
) -> Result<PageRecord> {
    let page = PageRepo::get_page(conn, page_id)?
        .ok_or_else(|| not_found("load_owned_page", "page", page_id))?;
    if page.owner_id != actor.actor_id {
        return Err(ExError::new(ExErrorKind::Unauthorized)
            .with_op("load_owned_page")
            .with_entity_id(page_id)
            .with_message("actor does not own this page")
            .with_request_id(actor.request_id.clone()));
    }
    Ok(page)
}
