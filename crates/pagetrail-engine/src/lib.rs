//! pagetrail engine - orchestration over the history kernel and store
//!
//! Every public command takes the connection, an [`EngineContext`] (config
//! and clock) and the acting user's [`pagetrail_core_types::ActorContext`],
//! checks the actor owns the page, and brackets its work with the canonical
//! logging macros.

pub mod commands;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::mutation::{AppliedMutation, MutationOutcome};
pub use commands::restore::{
    DiffReplay, RestoreOutcome, RestoreStrategy, Restorer, SnapshotReplace,
};
pub use commands::EngineContext;
