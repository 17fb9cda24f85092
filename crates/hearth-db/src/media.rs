//! Mapping between [`MediaPayload`] and its stored form.
//!
//! A message row carries a tag column; the attachments themselves live in
//! `message_media`, one row per item, ordered by an explicit `seq`. The tag
//! is what keeps "no media" and "empty album" apart: both have zero rows.

use rusqlite::{Transaction, params};

use hearth_types::{MediaItem, MediaPayload};

use crate::error::StoreError;

pub(crate) const TAG_NONE: i64 = 0;
pub(crate) const TAG_SINGLE: i64 = 1;
pub(crate) const TAG_GROUP: i64 = 2;

pub(crate) fn tag_of(payload: &MediaPayload) -> i64 {
    match payload {
        MediaPayload::None => TAG_NONE,
        MediaPayload::Single(_) => TAG_SINGLE,
        MediaPayload::Group(_) => TAG_GROUP,
    }
}

const INSERT_ITEM: &str = "INSERT INTO message_media
        (channel, message_id, seq, kind, path, preview, pos_x, pos_y, span_x, span_y)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

/// Write the media rows for one message inside the caller's transaction.
pub(crate) fn encode(
    tx: &Transaction<'_>,
    channel: u64,
    message_id: u64,
    payload: &MediaPayload,
) -> Result<(), StoreError> {
    let items = payload.items();
    if items.is_empty() {
        return Ok(());
    }

    let mut stmt = tx.prepare_cached(INSERT_ITEM)?;
    for (seq, item) in items.iter().enumerate() {
        stmt.execute(params![
            channel as i64,
            message_id as i64,
            seq as i64,
            item.kind.code(),
            item.path,
            item.preview,
            item.coordinates.x,
            item.coordinates.y,
            item.coordinates.span_x,
            item.coordinates.span_y,
        ])?;
    }
    Ok(())
}

/// Rebuild the payload from the stored tag and the item rows (already in
/// `seq` order). A tag that disagrees with the row count means the store is
/// damaged, not that the caller made a mistake.
pub(crate) fn decode(
    message_id: u64,
    tag: i64,
    mut items: Vec<MediaItem>,
) -> Result<MediaPayload, StoreError> {
    match tag {
        TAG_NONE if items.is_empty() => Ok(MediaPayload::None),
        TAG_SINGLE => {
            let rows = items.len();
            match items.pop() {
                Some(item) if rows == 1 => Ok(MediaPayload::Single(item)),
                _ => Err(StoreError::Corrupt(format!(
                    "message {message_id}: single-media tag with {rows} rows"
                ))),
            }
        }
        TAG_GROUP => Ok(MediaPayload::Group(items)),
        _ => Err(StoreError::Corrupt(format!(
            "message {message_id}: media tag {tag} with {} rows",
            items.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_types::{MediaCoordinates, MediaKind};

    fn item(path: &str) -> MediaItem {
        MediaItem {
            kind: MediaKind::Image,
            path: path.into(),
            preview: None,
            coordinates: MediaCoordinates::default(),
        }
    }

    #[test]
    fn tags_match_variants() {
        assert_eq!(tag_of(&MediaPayload::None), TAG_NONE);
        assert_eq!(tag_of(&MediaPayload::Single(item("a"))), TAG_SINGLE);
        assert_eq!(tag_of(&MediaPayload::Group(vec![])), TAG_GROUP);
    }

    #[test]
    fn decode_keeps_none_and_empty_group_apart() {
        assert_eq!(decode(1, TAG_NONE, vec![]).unwrap(), MediaPayload::None);
        assert_eq!(
            decode(1, TAG_GROUP, vec![]).unwrap(),
            MediaPayload::Group(vec![])
        );
    }

    #[test]
    fn decode_preserves_group_order() {
        let payload = decode(1, TAG_GROUP, vec![item("a"), item("b"), item("c")]).unwrap();
        let MediaPayload::Group(items) = payload else {
            panic!("expected group");
        };
        let paths: Vec<&str> = items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, ["a", "b", "c"]);
    }

    #[test]
    fn decode_rejects_mismatched_rows() {
        assert!(matches!(
            decode(1, TAG_NONE, vec![item("a")]),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            decode(1, TAG_SINGLE, vec![]),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            decode(1, TAG_SINGLE, vec![item("a"), item("b")]),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            decode(1, 9, vec![]),
            Err(StoreError::Corrupt(_))
        ));
    }
}
