//! Command orchestration layer.
//!
//! ## Logging Ownership
//!
//! Public commands own lifecycle logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal
//! details. Swallowed failures (audit recording, automatic capture) are
//! logged here at `warn`.

pub mod access;
pub mod engine_command;
pub mod history;
pub mod mutation;
pub mod recorder;
pub mod restore;
pub mod versions;

use pagetrail_core::model::ID_KEY;
use pagetrail_core::{Clock, HistoryConfig};
use serde_json::Value;

/// Fields never treated as changes.
pub const IGNORED_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Shared dependencies of every command.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub config: &'a HistoryConfig,
    pub clock: &'a dyn Clock,
}

impl<'a> EngineContext<'a> {
    pub fn new(config: &'a HistoryConfig, clock: &'a dyn Clock) -> Self {
        Self { config, clock }
    }
}

pub(crate) fn elapsed_ms(start: std::time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Copy of an element without its row id, ready to be created afresh.
pub(crate) fn strip_id(element: &Value) -> Value {
    match element {
        Value::Object(map) => {
            let mut map = map.clone();
            map.remove(ID_KEY);
            Value::Object(map)
        }
        other => other.clone(),
    }
}
