//! Restore orchestration.
//!
//! Two strategies bring a page back to an earlier state:
//!
//! 1. [`SnapshotReplace`]: copy a stored version over the page wholesale
//! 2. [`DiffReplay`]: revert every audit entry after a given one, newest
//!    first
//!
//! Both run through [`Restorer::run`], which owns the transaction: a
//! strategy either finishes and is committed, or fails and leaves the page
//! untouched.

#![allow(clippy::result_large_err)]

pub mod diff_replay;
pub mod snapshot_replace;

pub use diff_replay::DiffReplay;
pub use snapshot_replace::SnapshotReplace;

use crate::commands::{elapsed_ms, EngineContext};
use pagetrail_core::model::AuditLogEntry;
use pagetrail_core::{log_op_end, log_op_error, log_op_start};
use pagetrail_core_types::ActorContext;
use pagetrail_store::errors::{from_rusqlite, Result};
use rusqlite::{Connection, Transaction};

/// A way of bringing a page back to an earlier state.
///
/// Implementations write only through `tx` and never commit it.
pub trait RestoreStrategy {
    /// Operation name used in logs
    fn name(&self) -> &'static str;

    /// Apply the restore.
    ///
    /// # Errors
    ///
    /// Any error aborts the restore; the caller rolls `tx` back.
    fn apply(
        &self,
        tx: &Transaction<'_>,
        ctx: EngineContext<'_>,
        actor: &ActorContext,
    ) -> Result<RestoreOutcome>;
}

/// What a restore did.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOutcome {
    pub page_id: String,
    /// Audit entries reverted (diff replay only)
    pub reverted_count: usize,
    /// Collection rows written (snapshot replace only)
    pub rows_restored: usize,
    /// The entry recording the restore; `None` when nothing was reverted or
    /// recording failed
    pub log_entry: Option<AuditLogEntry>,
}

/// Runs restore strategies transactionally.
#[derive(Clone, Copy)]
pub struct Restorer<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> Restorer<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run `strategy` inside one transaction and commit only on success.
    ///
    /// # Errors
    ///
    /// - `NotFound`: unknown page, version or log entry, or one belonging to
    ///   another page
    /// - `Unauthorized`: the actor does not own the page
    /// - `CorruptedSnapshot`: the version document is unreadable
    /// - `Persistence`: database error
    pub fn run(
        &self,
        conn: &mut Connection,
        actor: &ActorContext,
        strategy: &dyn RestoreStrategy,
    ) -> Result<RestoreOutcome> {
        let op = strategy.name();
        log_op_start!(op, actor_id = actor.actor_id.as_str());
        let start = std::time::Instant::now();

        let outcome = self.run_impl(conn, actor, strategy).map_err(|e| {
            log_op_error!(op, e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        log_op_end!(
            op,
            duration_ms = elapsed_ms(start),
            page_id = outcome.page_id.as_str(),
            reverted_count = outcome.reverted_count,
            rows_restored = outcome.rows_restored
        );
        Ok(outcome)
    }

    fn run_impl(
        &self,
        conn: &mut Connection,
        actor: &ActorContext,
        strategy: &dyn RestoreStrategy,
    ) -> Result<RestoreOutcome> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let outcome = strategy.apply(&tx, self.ctx, actor)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(outcome)
    }
}

/// Restore a page from one of its stored versions.
///
/// # Errors
///
/// See [`Restorer::run`].
pub fn restore_from_version(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    page_id: &str,
    version_id: &str,
) -> Result<RestoreOutcome> {
    Restorer::new(ctx).run(conn, actor, &SnapshotReplace::new(page_id, version_id))
}

/// Undo every change recorded after `log_id`.
///
/// # Errors
///
/// See [`Restorer::run`].
pub fn restore_to_log_entry(
    conn: &mut Connection,
    ctx: EngineContext<'_>,
    actor: &ActorContext,
    log_id: &str,
) -> Result<RestoreOutcome> {
    Restorer::new(ctx).run(conn, actor, &DiffReplay::new(log_id))
}
