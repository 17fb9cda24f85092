//! `#[repr(C)]` mirror types for everything that crosses the boundary.
//!
//! Media crosses as a flat tagged-and-sized payload, never as a Rust enum:
//! the tag says which variant, `len`/`items` carry the data. Optional
//! strings are null pointers, never empty strings.

use std::os::raw::c_char;
use std::ptr::null_mut;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HearthMediaKind {
    Video = 0,
    Image = 1,
    Gif = 2,
    Audio = 3,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HearthMediaTag {
    /// No media at all; `len` must be 0.
    None = 0,
    /// Exactly one item; `len` must be 1.
    Single = 1,
    /// An album of `len` items (zero is a valid album).
    Group = 2,
}

/// Placement of one item on the 0–255 composite grid.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HearthMediaCoordinates {
    pub x: u8,
    pub y: u8,
    pub span_x: u8,
    pub span_y: u8,
}

#[repr(C)]
#[derive(Debug)]
pub struct HearthMediaItem {
    pub kind: HearthMediaKind,
    /// Cache-relative path; never null in a valid item.
    pub path: *mut c_char,
    /// Preview path, or null when absent.
    pub preview: *mut c_char,
    pub coordinates: HearthMediaCoordinates,
}

#[repr(C)]
#[derive(Debug)]
pub struct HearthMediaPayload {
    pub tag: HearthMediaTag,
    pub len: usize,
    /// Null when `len` is 0.
    pub items: *mut HearthMediaItem,
}

#[repr(C)]
#[derive(Debug)]
pub struct HearthMessage {
    pub id: u64,
    pub flags: u32,
    /// Raw text body, or null when absent.
    pub text: *mut c_char,
    pub media: HearthMediaPayload,
    pub sender: u64,
    pub channel: u64,
    pub sent_at_secs: u64,
    /// Sub-second remainder, always below 10^9.
    pub sent_at_nanos: u32,
    /// 0 means "not a reply".
    pub reply_id: u64,
}

#[repr(C)]
#[derive(Debug)]
pub struct HearthPermissions {
    /// Null when `len` is 0.
    pub data: *mut u16,
    pub len: usize,
}

#[repr(C)]
#[derive(Debug)]
pub struct HearthChannel {
    pub id: u64,
    pub title: *mut c_char,
    /// Null when the channel has no description.
    pub description: *mut c_char,
    /// Null when the channel has no avatar.
    pub avatar: *mut c_char,
    pub created_secs: u64,
    pub created_nanos: u32,
    pub enabled: bool,
    pub permissions: HearthPermissions,
}

/// Batch-transfer container for messages.
///
/// When `data` is null the call failed and `count` holds a negative status
/// code; check that before touching anything else. On success `count` is the
/// element count and `capacity` the allocated capacity — pass the whole
/// struct unchanged to `hearth_messages_free` exactly once.
#[repr(C)]
#[derive(Debug)]
pub struct HearthMessageArray {
    pub count: i64,
    pub capacity: usize,
    pub data: *mut HearthMessage,
}

impl HearthMessageArray {
    pub(crate) fn failure(code: i32) -> Self {
        Self {
            count: i64::from(code),
            capacity: 0,
            data: null_mut(),
        }
    }
}

/// Batch-transfer container for channels; same conventions as
/// [`HearthMessageArray`], released with `hearth_channels_free`.
#[repr(C)]
#[derive(Debug)]
pub struct HearthChannelArray {
    pub count: i64,
    pub capacity: usize,
    pub data: *mut HearthChannel,
}

impl HearthChannelArray {
    pub(crate) fn failure(code: i32) -> Self {
        Self {
            count: i64::from(code),
            capacity: 0,
            data: null_mut(),
        }
    }
}
