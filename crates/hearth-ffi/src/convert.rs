//! Conversions between core types and their `#[repr(C)]` mirrors, plus the
//! release walkers that undo every allocation the exports hand out.
//!
//! Output conversion allocates with `CString`/`Vec` and transfers ownership
//! to the caller; the matching free functions reconstruct the owners and drop
//! them. A conversion that fails halfway frees whatever it already built, so
//! a failed call never leaks and never exposes a partial result.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr::null_mut;

use hearth_types::{
    Channel, MediaCoordinates, MediaItem, MediaKind, MediaPayload, Message, Timestamp,
};

use crate::abi::{
    HearthChannel, HearthChannelArray, HearthMediaCoordinates, HearthMediaItem, HearthMediaKind,
    HearthMediaPayload, HearthMediaTag, HearthMessage, HearthMessageArray, HearthPermissions,
};
use crate::status::{HEARTH_ERR_ALLOCATION, HEARTH_ERR_CONSTRAINT};

// ── Input: borrowed caller data → owned core types ──

/// Read an optional C string. Null is "absent"; invalid UTF-8 rejects the
/// batch it arrived in.
pub(crate) unsafe fn import_opt_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, i32> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|_| HEARTH_ERR_CONSTRAINT)
}

pub(crate) unsafe fn import_message(msg: &HearthMessage) -> Result<Message, i32> {
    let text = import_opt_str(msg.text)?.map(str::to_owned);
    let media = import_payload(&msg.media)?;
    Ok(Message {
        id: msg.id,
        flags: msg.flags,
        text,
        media,
        sender: msg.sender,
        channel: msg.channel,
        sent_at: Timestamp::new(msg.sent_at_secs, msg.sent_at_nanos),
        reply_id: msg.reply_id,
    })
}

/// Decode the flat tagged payload, enforcing that the tag and the item count
/// agree before anything touches the store.
unsafe fn import_payload(payload: &HearthMediaPayload) -> Result<MediaPayload, i32> {
    match payload.tag {
        HearthMediaTag::None => {
            if payload.len != 0 {
                return Err(HEARTH_ERR_CONSTRAINT);
            }
            Ok(MediaPayload::None)
        }
        HearthMediaTag::Single => {
            if payload.len != 1 || payload.items.is_null() {
                return Err(HEARTH_ERR_CONSTRAINT);
            }
            Ok(MediaPayload::Single(import_item(&*payload.items)?))
        }
        HearthMediaTag::Group => {
            if payload.len == 0 {
                return Ok(MediaPayload::Group(Vec::new()));
            }
            if payload.items.is_null() {
                return Err(HEARTH_ERR_CONSTRAINT);
            }
            let raw = std::slice::from_raw_parts(payload.items, payload.len);
            let mut items = Vec::with_capacity(raw.len());
            for item in raw {
                items.push(import_item(item)?);
            }
            Ok(MediaPayload::Group(items))
        }
    }
}

unsafe fn import_item(item: &HearthMediaItem) -> Result<MediaItem, i32> {
    let path = import_opt_str(item.path)?
        .ok_or(HEARTH_ERR_CONSTRAINT)?
        .to_owned();
    let preview = import_opt_str(item.preview)?.map(str::to_owned);
    Ok(MediaItem {
        kind: import_kind(item.kind),
        path,
        preview,
        coordinates: MediaCoordinates {
            x: item.coordinates.x,
            y: item.coordinates.y,
            span_x: item.coordinates.span_x,
            span_y: item.coordinates.span_y,
        },
    })
}

fn import_kind(kind: HearthMediaKind) -> MediaKind {
    match kind {
        HearthMediaKind::Video => MediaKind::Video,
        HearthMediaKind::Image => MediaKind::Image,
        HearthMediaKind::Gif => MediaKind::Gif,
        HearthMediaKind::Audio => MediaKind::Audio,
    }
}

// ── Output: owned core types → caller-owned C data ──

fn export_kind(kind: MediaKind) -> HearthMediaKind {
    match kind {
        MediaKind::Video => HearthMediaKind::Video,
        MediaKind::Image => HearthMediaKind::Image,
        MediaKind::Gif => HearthMediaKind::Gif,
        MediaKind::Audio => HearthMediaKind::Audio,
    }
}

fn export_string(s: &str) -> Result<*mut c_char, i32> {
    CString::new(s)
        .map(CString::into_raw)
        .map_err(|_| HEARTH_ERR_ALLOCATION)
}

fn export_opt_string(s: Option<&str>) -> Result<*mut c_char, i32> {
    match s {
        Some(s) => export_string(s),
        None => Ok(null_mut()),
    }
}

fn export_item(item: &MediaItem) -> Result<HearthMediaItem, i32> {
    let path = export_string(&item.path)?;
    let preview = match export_opt_string(item.preview.as_deref()) {
        Ok(preview) => preview,
        Err(code) => {
            unsafe { free_cstr(path) };
            return Err(code);
        }
    };
    Ok(HearthMediaItem {
        kind: export_kind(item.kind),
        path,
        preview,
        coordinates: HearthMediaCoordinates {
            x: item.coordinates.x,
            y: item.coordinates.y,
            span_x: item.coordinates.span_x,
            span_y: item.coordinates.span_y,
        },
    })
}

fn export_payload(payload: &MediaPayload) -> Result<HearthMediaPayload, i32> {
    let tag = match payload {
        MediaPayload::None => HearthMediaTag::None,
        MediaPayload::Single(_) => HearthMediaTag::Single,
        MediaPayload::Group(_) => HearthMediaTag::Group,
    };
    let items = payload.items();
    if items.is_empty() {
        return Ok(HearthMediaPayload {
            tag,
            len: 0,
            items: null_mut(),
        });
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match export_item(item) {
            Ok(converted) => out.push(converted),
            Err(code) => {
                unsafe { free_item_fields_of(&out) };
                return Err(code);
            }
        }
    }
    let boxed = out.into_boxed_slice();
    let len = boxed.len();
    Ok(HearthMediaPayload {
        tag,
        len,
        items: Box::into_raw(boxed) as *mut HearthMediaItem,
    })
}

fn export_message(m: &Message) -> Result<HearthMessage, i32> {
    let text = export_opt_string(m.text.as_deref())?;
    let media = match export_payload(&m.media) {
        Ok(media) => media,
        Err(code) => {
            unsafe { free_cstr(text) };
            return Err(code);
        }
    };
    Ok(HearthMessage {
        id: m.id,
        flags: m.flags,
        text,
        media,
        sender: m.sender,
        channel: m.channel,
        sent_at_secs: m.sent_at.secs,
        sent_at_nanos: m.sent_at.nanos,
        reply_id: m.reply_id,
    })
}

pub(crate) fn export_messages(messages: &[Message]) -> HearthMessageArray {
    let mut out = Vec::with_capacity(messages.len());
    for m in messages {
        match export_message(m) {
            Ok(converted) => out.push(converted),
            Err(code) => {
                unsafe { free_message_vec(out) };
                return HearthMessageArray::failure(code);
            }
        }
    }
    let (data, count, capacity) = vec_into_raw(out);
    HearthMessageArray {
        count: count as i64,
        capacity,
        data,
    }
}

fn export_permissions(perms: &[u16]) -> HearthPermissions {
    if perms.is_empty() {
        return HearthPermissions {
            data: null_mut(),
            len: 0,
        };
    }
    let boxed: Box<[u16]> = perms.to_vec().into_boxed_slice();
    let len = boxed.len();
    HearthPermissions {
        data: Box::into_raw(boxed) as *mut u16,
        len,
    }
}

fn export_channel(c: &Channel) -> Result<HearthChannel, i32> {
    let title = export_string(&c.title)?;
    let description = match export_opt_string(c.description.as_deref()) {
        Ok(ptr) => ptr,
        Err(code) => {
            unsafe { free_cstr(title) };
            return Err(code);
        }
    };
    let avatar = match export_opt_string(c.avatar.as_deref()) {
        Ok(ptr) => ptr,
        Err(code) => {
            unsafe {
                free_cstr(title);
                free_cstr(description);
            }
            return Err(code);
        }
    };
    Ok(HearthChannel {
        id: c.id,
        title,
        description,
        avatar,
        created_secs: c.created_at.secs,
        created_nanos: c.created_at.nanos,
        enabled: c.enabled,
        permissions: export_permissions(&c.permissions),
    })
}

pub(crate) fn export_channels(channels: &[Channel]) -> HearthChannelArray {
    let mut out = Vec::with_capacity(channels.len());
    for c in channels {
        match export_channel(c) {
            Ok(converted) => out.push(converted),
            Err(code) => {
                unsafe { free_channel_vec(out) };
                return HearthChannelArray::failure(code);
            }
        }
    }
    let (data, count, capacity) = vec_into_raw(out);
    HearthChannelArray {
        count: count as i64,
        capacity,
        data,
    }
}

fn vec_into_raw<T>(mut v: Vec<T>) -> (*mut T, usize, usize) {
    let data = v.as_mut_ptr();
    let len = v.len();
    let cap = v.capacity();
    std::mem::forget(v);
    (data, len, cap)
}

// ── Release walkers ──

pub(crate) unsafe fn free_cstr(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

unsafe fn free_item_fields_of(items: &[HearthMediaItem]) {
    for item in items {
        free_cstr(item.path);
        free_cstr(item.preview);
    }
}

pub(crate) unsafe fn free_payload(payload: &HearthMediaPayload) {
    if payload.items.is_null() {
        return;
    }
    let items = Vec::from_raw_parts(payload.items, payload.len, payload.len);
    free_item_fields_of(&items);
}

pub(crate) unsafe fn free_message_fields(m: &HearthMessage) {
    free_cstr(m.text);
    free_payload(&m.media);
}

unsafe fn free_message_vec(messages: Vec<HearthMessage>) {
    for m in &messages {
        free_message_fields(m);
    }
}

pub(crate) unsafe fn free_channel_fields(c: &HearthChannel) {
    free_cstr(c.title);
    free_cstr(c.description);
    free_cstr(c.avatar);
    if !c.permissions.data.is_null() {
        drop(Vec::from_raw_parts(
            c.permissions.data,
            c.permissions.len,
            c.permissions.len,
        ));
    }
}

unsafe fn free_channel_vec(channels: Vec<HearthChannel>) {
    for c in &channels {
        free_channel_fields(c);
    }
}
