//! Engine-level commands: one enum covering every write the engine accepts.

#![allow(clippy::result_large_err)]

use crate::commands::mutation::{self, MutationOutcome};
use crate::commands::restore::{self, RestoreOutcome};
use crate::commands::versions;
use crate::commands::EngineContext;
use pagetrail_core::model::CollectionKind;
use pagetrail_core::snapshot::VersionKind;
use pagetrail_core_types::ActorContext;
use pagetrail_store::errors::Result;
use pagetrail_store::versions::CaptureResult;
use rusqlite::Connection;
use serde_json::{Map, Value};

/// Engine-level commands that write to the database.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    CreatePage {
        settings: Map<String, Value>,
        status: Map<String, Value>,
    },
    UpdateSettings {
        page_id: String,
        patch: Map<String, Value>,
    },
    UpdateStatus {
        page_id: String,
        patch: Map<String, Value>,
    },
    SaveOrderedCollection {
        page_id: String,
        collection: CollectionKind,
        elements: Vec<Value>,
    },
    ReplaceUnorderedCollection {
        page_id: String,
        collection: CollectionKind,
        rows: Vec<Value>,
    },
    SetValueCollection {
        page_id: String,
        collection: CollectionKind,
        values: Vec<Value>,
    },
    /// Capture a version; `manual` marks a user backup.
    CaptureVersion {
        page_id: String,
        label: Option<String>,
        manual: bool,
    },
    RestoreFromVersion {
        page_id: String,
        version_id: String,
    },
    /// Undo every change after `log_id`. When `page_id` is given the entry
    /// must belong to that page.
    RestoreToLogEntry {
        log_id: String,
        page_id: Option<String>,
    },
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommandResult {
    PageCreated { page_id: String },
    Mutation(MutationOutcome),
    VersionCaptured(CaptureResult),
    Restored(RestoreOutcome),
}

/// Apply an engine command on behalf of `actor`.
///
/// # Errors
///
/// Propagates the error of the underlying command.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::CreatePage { settings, status } => {
            let page_id = mutation::create_page(conn, ctx, actor, settings, status)?;
            Ok(EngineCommandResult::PageCreated { page_id })
        }
        EngineCommand::UpdateSettings { page_id, patch } => {
            mutation::update_settings(conn, ctx, actor, &page_id, &patch)
                .map(EngineCommandResult::Mutation)
        }
        EngineCommand::UpdateStatus { page_id, patch } => {
            mutation::update_status(conn, ctx, actor, &page_id, &patch)
                .map(EngineCommandResult::Mutation)
        }
        EngineCommand::SaveOrderedCollection {
            page_id,
            collection,
            elements,
        } => mutation::save_ordered_collection(conn, ctx, actor, &page_id, collection, elements)
            .map(EngineCommandResult::Mutation),
        EngineCommand::ReplaceUnorderedCollection {
            page_id,
            collection,
            rows,
        } => mutation::replace_unordered_collection(conn, ctx, actor, &page_id, collection, rows)
            .map(EngineCommandResult::Mutation),
        EngineCommand::SetValueCollection {
            page_id,
            collection,
            values,
        } => mutation::set_value_collection(conn, ctx, actor, &page_id, collection, values)
            .map(EngineCommandResult::Mutation),
        EngineCommand::CaptureVersion {
            page_id,
            label,
            manual,
        } => {
            let kind = if manual {
                VersionKind::Manual
            } else {
                VersionKind::Auto
            };
            versions::capture_version(conn, ctx, actor, &page_id, label.as_deref(), kind)
                .map(EngineCommandResult::VersionCaptured)
        }
        EngineCommand::RestoreFromVersion {
            page_id,
            version_id,
        } => restore::restore_from_version(conn, ctx, actor, &page_id, &version_id)
            .map(EngineCommandResult::Restored),
        EngineCommand::RestoreToLogEntry { log_id, page_id } => {
            let strategy = match page_id {
                Some(page_id) => restore::DiffReplay::new(log_id).for_page(page_id),
                None => restore::DiffReplay::new(log_id),
            };
            restore::Restorer::new(ctx)
                .run(conn, actor, &strategy)
                .map(EngineCommandResult::Restored)
        }
    }
}
