//! The closed status-code taxonomy of the boundary.
//!
//! `0` is success; every failure is one of the negative codes below. Array
//! returns fold the code into the `count` field instead of using a second
//! status channel.

use hearth_db::StoreError;
use hearth_sync::SyncError;

pub const HEARTH_OK: i32 = 0;
/// A null engine handle was passed where an open one is required.
pub const HEARTH_ERR_NOT_INITIALIZED: i32 = -1;
/// The store file could not be opened (or the path argument was unusable).
pub const HEARTH_ERR_STORAGE_OPEN: i32 = -2;
/// Schema-level or other storage failure; fatal to the session.
pub const HEARTH_ERR_SCHEMA: i32 = -3;
/// The batch violated a constraint; nothing was persisted.
pub const HEARTH_ERR_CONSTRAINT: i32 = -4;
/// A result could not be materialized for the caller.
pub const HEARTH_ERR_ALLOCATION: i32 = -5;
/// Transport-level failure reaching the directory service.
pub const HEARTH_ERR_NETWORK: i32 = -6;
/// The directory service rejected the credentials.
pub const HEARTH_ERR_AUTH: i32 = -7;
/// The directory response could not be parsed.
pub const HEARTH_ERR_PARSE: i32 = -8;

/// The status code a store failure crosses the boundary as.
pub fn store_status(err: &StoreError) -> i32 {
    match err {
        StoreError::Open { .. } => HEARTH_ERR_STORAGE_OPEN,
        StoreError::Constraint(_) => HEARTH_ERR_CONSTRAINT,
        StoreError::Poisoned | StoreError::Corrupt(_) | StoreError::Sqlite(_) => HEARTH_ERR_SCHEMA,
    }
}

/// The status code a sync failure crosses the boundary as.
pub fn sync_status(err: &SyncError) -> i32 {
    match err {
        SyncError::InvalidUrl(_) | SyncError::Network(_) | SyncError::Status(_) => {
            HEARTH_ERR_NETWORK
        }
        SyncError::Auth(_) => HEARTH_ERR_AUTH,
        SyncError::Parse(_) => HEARTH_ERR_PARSE,
        SyncError::Store(e) => store_status(e),
    }
}
