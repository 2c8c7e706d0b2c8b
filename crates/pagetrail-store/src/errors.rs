//! Error helpers for pagetrail-store
//!
//! Wraps pagetrail-core ExError with store-specific constructors

use pagetrail_core::errors::{ExError, ExErrorKind, HistoryError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already-applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error. Busy and locked databases
/// map to `Concurrency` so callers can retry.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
            ExErrorKind::Concurrency
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Lift a kernel error, tagging the operation it surfaced in
pub fn from_history(op: &str, err: HistoryError) -> ExError {
    ExError::from(err).with_op(op)
}

/// Create a serialization error
pub fn serialization(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op)
        .with_message(err.to_string())
}

/// Not-found error. The message names only the entity type so a row owned
/// by another page reads exactly like a missing one.
pub fn not_found(op: &str, entity: &str, id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op)
        .with_entity_id(id)
        .with_message(format!("{} not found", entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_database_maps_to_concurrency() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert_eq!(from_rusqlite(busy).kind(), ExErrorKind::Concurrency);
        assert_eq!(
            from_rusqlite(rusqlite::Error::QueryReturnedNoRows).kind(),
            ExErrorKind::Persistence
        );
    }
}
