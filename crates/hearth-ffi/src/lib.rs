//! C ABI for the hearth cache engine.
//!
//! FFI exports for embedding the engine in a non-Rust client (dart:ffi,
//! C/C++, anything that can call a C function). Every call is synchronous on
//! the invoking thread; the engine never spawns threads of its own.
//!
//! # Ownership
//!
//! The engine allocates everything it returns; the caller owns it on return
//! and must release it exactly once with the matching `*_free` function.
//! After the release call none of the memory reachable from the array may be
//! touched again. Double-release and use-after-release are caller errors the
//! engine cannot detect — no ownership tracking survives the boundary.
//!
//! # Failure encoding
//!
//! Status-returning functions give `HEARTH_OK` (0) or a negative code from
//! [`status`]. Array-returning functions signal failure with a null `data`
//! pointer and the code folded into `count`, so one null check suffices
//! before any dereference. Failed calls allocate nothing.

mod abi;
mod convert;
mod status;

pub use abi::*;
pub use status::*;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr::null_mut;

use tracing::error;

use hearth_db::Database;

/// An open engine: the storage connection plus everything hanging off it.
/// Opaque to the caller; create with [`hearth_open`], destroy with
/// [`hearth_close`].
pub struct HearthEngine {
    db: Database,
}

/// Open (creating if missing) the store at `db_path` and hand back an engine
/// handle through `engine_out`.
///
/// Returns `HEARTH_OK` and a non-null handle on success; on failure writes
/// null to `engine_out` and returns a negative code.
///
/// # Safety
/// `db_path` must be a valid NUL-terminated string; `engine_out` must be a
/// valid pointer to pointer-sized writable memory.
#[no_mangle]
pub unsafe extern "C" fn hearth_open(
    db_path: *const c_char,
    engine_out: *mut *mut HearthEngine,
) -> i32 {
    if engine_out.is_null() {
        return HEARTH_ERR_STORAGE_OPEN;
    }
    *engine_out = null_mut();
    if db_path.is_null() {
        return HEARTH_ERR_STORAGE_OPEN;
    }
    let path = match CStr::from_ptr(db_path).to_str() {
        Ok(path) => path,
        Err(_) => return HEARTH_ERR_STORAGE_OPEN,
    };

    match Database::open(Path::new(path)) {
        Ok(db) => {
            *engine_out = Box::into_raw(Box::new(HearthEngine { db }));
            HEARTH_OK
        }
        Err(e) => {
            error!("hearth_open failed: {e}");
            store_status(&e)
        }
    }
}

/// Release an engine handle and its storage connections. Null is a no-op.
/// The handle must not be used afterwards.
///
/// # Safety
/// `engine` must be null or a handle from [`hearth_open`] that has not been
/// closed yet.
#[no_mangle]
pub unsafe extern "C" fn hearth_close(engine: *mut HearthEngine) {
    if engine.is_null() {
        return;
    }
    drop(Box::from_raw(engine));
}

/// Idempotently create every table the engine needs. Safe to call on an
/// already-initialized store.
///
/// # Safety
/// `engine` must be null or a live handle from [`hearth_open`].
#[no_mangle]
pub unsafe extern "C" fn hearth_create_schema(engine: *mut HearthEngine) -> i32 {
    let Some(engine) = engine.as_ref() else {
        return HEARTH_ERR_NOT_INITIALIZED;
    };
    match engine.db.create_schema() {
        Ok(()) => HEARTH_OK,
        Err(e) => {
            error!("hearth_create_schema failed: {e}");
            store_status(&e)
        }
    }
}

/// Atomically empty every table. Either everything is cleared or nothing is.
///
/// # Safety
/// `engine` must be null or a live handle from [`hearth_open`].
#[no_mangle]
pub unsafe extern "C" fn hearth_clear(engine: *mut HearthEngine) -> i32 {
    let Some(engine) = engine.as_ref() else {
        return HEARTH_ERR_NOT_INITIALIZED;
    };
    match engine.db.clear() {
        Ok(()) => HEARTH_OK,
        Err(e) => {
            error!("hearth_clear failed: {e}");
            store_status(&e)
        }
    }
}

/// Insert `len` messages from `messages` in one transaction. All-or-nothing:
/// any malformed payload or duplicate `(channel, id)` rejects the whole
/// batch with `HEARTH_ERR_CONSTRAINT` and persists nothing. The input is
/// treated read-only; the engine keeps no reference to it.
///
/// # Safety
/// `engine` must be null or a live handle. `messages` must point to at least
/// `len` valid `HearthMessage` values (may be null when `len` is 0), and
/// every non-null string inside them must be NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn hearth_insert_messages(
    engine: *mut HearthEngine,
    messages: *const HearthMessage,
    len: usize,
) -> i32 {
    let Some(engine) = engine.as_ref() else {
        return HEARTH_ERR_NOT_INITIALIZED;
    };
    if len == 0 {
        return HEARTH_OK;
    }
    if messages.is_null() {
        return HEARTH_ERR_CONSTRAINT;
    }

    let raw = std::slice::from_raw_parts(messages, len);
    let mut batch = Vec::with_capacity(len);
    for message in raw {
        match convert::import_message(message) {
            Ok(message) => batch.push(message),
            Err(code) => return code,
        }
    }

    match engine.db.insert_messages(&batch) {
        Ok(()) => HEARTH_OK,
        Err(e) => {
            error!("hearth_insert_messages failed: {e}");
            store_status(&e)
        }
    }
}

/// Fetch up to `amount` messages from `channel`, most recent first. An
/// unknown channel or `amount == 0` is an empty result, not an error. The
/// returned array and everything nested in it is caller-owned; release with
/// [`hearth_messages_free`] exactly once.
///
/// # Safety
/// `engine` must be null or a live handle from [`hearth_open`].
#[no_mangle]
pub unsafe extern "C" fn hearth_get_messages(
    engine: *mut HearthEngine,
    channel: u64,
    amount: usize,
) -> HearthMessageArray {
    let Some(engine) = engine.as_ref() else {
        return HearthMessageArray::failure(HEARTH_ERR_NOT_INITIALIZED);
    };
    match engine.db.get_messages(channel, amount) {
        Ok(messages) => convert::export_messages(&messages),
        Err(e) => {
            error!("hearth_get_messages failed: {e}");
            HearthMessageArray::failure(store_status(&e))
        }
    }
}

/// Release a message array returned by [`hearth_get_messages`], including
/// every string and media item inside it. An absent (null-data) array is a
/// no-op, so failure results can be passed here unconditionally.
///
/// # Safety
/// `array` must be exactly as returned, unmodified, and not already freed.
#[no_mangle]
pub unsafe extern "C" fn hearth_messages_free(array: HearthMessageArray) {
    if array.data.is_null() || array.count < 0 {
        return;
    }
    let messages = Vec::from_raw_parts(array.data, array.count as usize, array.capacity);
    for message in &messages {
        convert::free_message_fields(message);
    }
}

/// List every locally cached channel, ordered by id. Caller-owned result;
/// release with [`hearth_channels_free`].
///
/// # Safety
/// `engine` must be null or a live handle from [`hearth_open`].
#[no_mangle]
pub unsafe extern "C" fn hearth_get_channels(engine: *mut HearthEngine) -> HearthChannelArray {
    let Some(engine) = engine.as_ref() else {
        return HearthChannelArray::failure(HEARTH_ERR_NOT_INITIALIZED);
    };
    match engine.db.get_channels() {
        Ok(channels) => convert::export_channels(&channels),
        Err(e) => {
            error!("hearth_get_channels failed: {e}");
            HearthChannelArray::failure(store_status(&e))
        }
    }
}

/// Toggle the local "subscribed" flag of one channel. Unknown channels are
/// ignored. Sync merges never change this flag.
///
/// # Safety
/// `engine` must be null or a live handle from [`hearth_open`].
#[no_mangle]
pub unsafe extern "C" fn hearth_set_channel_enabled(
    engine: *mut HearthEngine,
    channel: u64,
    enabled: bool,
) -> i32 {
    let Some(engine) = engine.as_ref() else {
        return HEARTH_ERR_NOT_INITIALIZED;
    };
    match engine.db.set_channel_enabled(channel, enabled) {
        Ok(_) => HEARTH_OK,
        Err(e) => {
            error!("hearth_set_channel_enabled failed: {e}");
            store_status(&e)
        }
    }
}

/// Fetch the channel list for `uid` from the directory service at
/// `directory_url` (bearer `token`), merge it into the local store, and
/// return the merged channels. Blocks for the full network round trip; the
/// caller owns deadline enforcement.
///
/// Any network, auth, or parse failure returns the failure convention and
/// leaves the local store untouched.
///
/// # Safety
/// `engine` must be null or a live handle. `token` and `directory_url` must
/// be valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn hearth_load_channels(
    engine: *mut HearthEngine,
    uid: u64,
    token: *const c_char,
    directory_url: *const c_char,
) -> HearthChannelArray {
    let Some(engine) = engine.as_ref() else {
        return HearthChannelArray::failure(HEARTH_ERR_NOT_INITIALIZED);
    };
    let Ok(Some(token)) = convert::import_opt_str(token) else {
        return HearthChannelArray::failure(HEARTH_ERR_NETWORK);
    };
    let Ok(Some(url)) = convert::import_opt_str(directory_url) else {
        return HearthChannelArray::failure(HEARTH_ERR_NETWORK);
    };

    match hearth_sync::load_channels(&engine.db, uid, token, url) {
        Ok(channels) => convert::export_channels(&channels),
        Err(e) => {
            error!("hearth_load_channels failed: {e}");
            HearthChannelArray::failure(sync_status(&e))
        }
    }
}

/// Release a channel array returned by [`hearth_get_channels`] or
/// [`hearth_load_channels`]. An absent (null-data) array is a no-op.
///
/// # Safety
/// `array` must be exactly as returned, unmodified, and not already freed.
#[no_mangle]
pub unsafe extern "C" fn hearth_channels_free(array: HearthChannelArray) {
    if array.data.is_null() || array.count < 0 {
        return;
    }
    let channels = Vec::from_raw_parts(array.data, array.count as usize, array.capacity);
    for channel in &channels {
        convert::free_channel_fields(channel);
    }
}
