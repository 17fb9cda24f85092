use serde::{Deserialize, Serialize};

/// Wall-clock instant split into whole seconds and the sub-second remainder.
///
/// `nanos` is always in `[0, 1_000_000_000)` — it never carries whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    /// Build a timestamp, folding any whole seconds in `nanos` into `secs`.
    pub fn new(secs: u64, nanos: u32) -> Self {
        const NANOS_PER_SEC: u32 = 1_000_000_000;
        Self {
            secs: secs + u64::from(nanos / NANOS_PER_SEC),
            nanos: nanos % NANOS_PER_SEC,
        }
    }
}

/// Format of a single attachment. One value at a time — message-level
/// content flags live in [`crate::flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Gif,
    Audio,
}

impl MediaKind {
    /// Stable storage code for this kind.
    pub fn code(self) -> u8 {
        match self {
            MediaKind::Video => 0,
            MediaKind::Image => 1,
            MediaKind::Gif => 2,
            MediaKind::Audio => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MediaKind::Video),
            1 => Some(MediaKind::Image),
            2 => Some(MediaKind::Gif),
            3 => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// Placement of one media item on the composite-attachment grid.
///
/// The grid is 0–255 in both axes; a lone attachment ignores these entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCoordinates {
    pub x: u8,
    pub y: u8,
    pub span_x: u8,
    pub span_y: u8,
}

/// One attachment: a cached file path plus layout metadata.
///
/// Paths are relative to the caller's cache root (e.g. `audio/20240915T145701.ogg`),
/// never absolute — the engine stores paths, not blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub path: String,
    /// Preview/thumbnail path. Meaningful for visual kinds; usually absent for audio.
    pub preview: Option<String>,
    pub coordinates: MediaCoordinates,
}

/// Media carried by a message.
///
/// `None` and `Group(vec![])` are distinct states: a message with no media at
/// all versus a message that is an (empty) album. Both round-trip through the
/// store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaPayload {
    None,
    Single(MediaItem),
    Group(Vec<MediaItem>),
}

impl MediaPayload {
    /// The attached items as a slice, in layout order.
    pub fn items(&self) -> &[MediaItem] {
        match self {
            MediaPayload::None => &[],
            MediaPayload::Single(item) => std::slice::from_ref(item),
            MediaPayload::Group(items) => items,
        }
    }
}

/// One chat message as cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier of the message inside its channel; `(channel, id)` is unique.
    pub id: u64,
    /// Content-flag bitmask (see [`crate::flags`]); stored verbatim, never interpreted.
    pub flags: u32,
    pub text: Option<String>,
    pub media: MediaPayload,
    pub sender: u64,
    pub channel: u64,
    pub sent_at: Timestamp,
    /// Id of the message this one replies to; `0` means "not a reply".
    /// The store does not require the target to exist.
    pub reply_id: u64,
}

/// One conversation/broadcast target as cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    /// Set when the channel is first stored; later upserts keep the original.
    pub created_at: Timestamp,
    /// Local "subscribed" flag. Toggled by the caller, never by a sync merge.
    pub enabled: bool,
    /// Opaque capability codes, order-preserving. The engine never interprets them.
    pub permissions: Vec<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_folds_whole_seconds() {
        let ts = Timestamp::new(10, 2_500_000_000);
        assert_eq!(ts.secs, 12);
        assert_eq!(ts.nanos, 500_000_000);

        let plain = Timestamp::new(10, 999_999_999);
        assert_eq!(plain.secs, 10);
        assert_eq!(plain.nanos, 999_999_999);
    }

    #[test]
    fn payload_items_views() {
        let item = MediaItem {
            kind: MediaKind::Image,
            path: "img/a.png".into(),
            preview: None,
            coordinates: MediaCoordinates::default(),
        };
        assert!(MediaPayload::None.items().is_empty());
        assert_eq!(MediaPayload::Single(item.clone()).items().len(), 1);
        assert!(MediaPayload::Group(vec![]).items().is_empty());
        assert_eq!(MediaPayload::Group(vec![item.clone(), item]).items().len(), 2);
    }

    #[test]
    fn media_kind_codes_round_trip() {
        for kind in [MediaKind::Video, MediaKind::Image, MediaKind::Gif, MediaKind::Audio] {
            assert_eq!(MediaKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(MediaKind::from_code(9), None);
    }

    #[test]
    fn channel_serializes_cleanly() {
        let channel = Channel {
            id: 7,
            title: "general".into(),
            description: None,
            avatar: Some("icons/7.png".into()),
            created_at: Timestamp::new(1_700_000_000, 42),
            enabled: true,
            permissions: vec![1, 4],
        };
        let json = serde_json::to_string(&channel).unwrap();
        let back: Channel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, channel);
    }
}
