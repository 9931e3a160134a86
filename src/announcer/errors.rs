use thiserror::Error;

use super::store::Provenance;

/// Errors that can arise in the announcement store and selection engine.
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// Rejected input (empty line set, read-only source, etc.).
    #[error("validation error: {0}")]
    Validation(String),

    /// Edit/delete referenced a positional index that no longer exists.
    #[error("no {provenance} announcement at index {index} (store has {len})")]
    IndexNotFound {
        provenance: Provenance,
        index: usize,
        len: usize,
    },

    /// Wrapper around IO errors (state file reads/writes, locking).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
