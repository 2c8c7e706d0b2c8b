//! Digests of stored version documents.
//!
//! The digest is taken over the exact stored text, so any change to the
//! stored bytes is detected on read.

use crate::errors::{HistoryError, Result};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA256 of a stored document (64 characters).
pub fn compute_document_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a stored document against its recorded digest.
///
/// # Errors
///
/// Returns `HistoryError::CorruptedSnapshot` on mismatch.
pub fn verify_document_digest(text: &str, expected: &str) -> Result<()> {
    let actual = compute_document_digest(text);
    if actual == expected {
        Ok(())
    } else {
        Err(HistoryError::CorruptedSnapshot {
            reason: format!("digest mismatch: expected {}, found {}", expected, actual),
        })
    }
}
