use thiserror::Error;

use hearth_db::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid directory url: {0}")]
    InvalidUrl(String),

    /// Transport-level failure: DNS, connect, TLS, read.
    #[error("directory request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The directory rejected the credentials (HTTP 401/403).
    #[error("directory rejected credentials (http {0})")]
    Auth(u16),

    /// Any other non-success HTTP status.
    #[error("directory returned http {0}")]
    Status(u16),

    #[error("could not parse directory response: {0}")]
    Parse(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
