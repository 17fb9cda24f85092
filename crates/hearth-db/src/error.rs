use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not open store at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// A connection mutex was poisoned by a panicking writer. Treated as
    /// fatal to the session, like any other storage-level failure.
    #[error("store lock poisoned")]
    Poisoned,

    /// The whole batch was rejected; nothing was persisted.
    #[error("batch rejected: {0}")]
    Constraint(String),

    /// Rows on disk disagree with the media tag they are attached to.
    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Distinguishes a constraint rejection (caller-recoverable) from other
/// SQLite failures when executing a write.
pub(crate) fn classify_write(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, message)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Constraint(
                message
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string()),
            )
        }
        _ => StoreError::Sqlite(err),
    }
}
