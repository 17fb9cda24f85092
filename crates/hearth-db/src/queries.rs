use std::collections::HashMap;

use rusqlite::{Connection, TransactionBehavior, params};

use hearth_types::{Channel, MediaCoordinates, MediaItem, MediaKind, Message, Timestamp};

use crate::Database;
use crate::error::{StoreError, classify_write};
use crate::media;

const INSERT_MESSAGE: &str = "INSERT INTO messages
        (channel, id, sender, flags, body, media_tag, sent_at, sent_ns, reply_id)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const UPSERT_CHANNEL: &str = "INSERT INTO channels
        (id, title, description, avatar, created_at, created_ns, enabled)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        description = excluded.description,
        avatar = excluded.avatar";

impl Database {
    // -- Messages --

    /// Insert the whole batch in one transaction. If any message is rejected
    /// (duplicate `(channel, id)`, malformed row), nothing is persisted.
    pub fn insert_messages(&self, messages: &[Message]) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(INSERT_MESSAGE)?;
                for m in messages {
                    stmt.execute(params![
                        m.channel as i64,
                        m.id as i64,
                        m.sender as i64,
                        m.flags,
                        m.text,
                        media::tag_of(&m.media),
                        m.sent_at.secs as i64,
                        m.sent_at.nanos,
                        m.reply_id as i64,
                    ])
                    .map_err(classify_write)?;
                    media::encode(&tx, m.channel, m.id, &m.media)?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Up to `amount` messages from `channel`, most recent first (`sent_at`
    /// desc, ties newest-inserted first). An unknown channel or `amount == 0`
    /// yields an empty vec. The whole read runs inside one transaction so the
    /// message rows and their media rows come from the same snapshot.
    pub fn get_messages(&self, channel: u64, amount: usize) -> Result<Vec<Message>, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

            let rows = query_message_rows(&tx, channel, amount)?;
            let mut media_by_msg = query_media_rows(&tx, channel, &rows)?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let items = media_by_msg.remove(&row.id).unwrap_or_default();
                let payload = media::decode(row.id as u64, row.tag, items)?;
                out.push(Message {
                    id: row.id as u64,
                    flags: row.flags,
                    text: row.body,
                    media: payload,
                    sender: row.sender as u64,
                    channel,
                    sent_at: Timestamp {
                        secs: row.secs as u64,
                        nanos: row.ns,
                    },
                    reply_id: row.reply as u64,
                });
            }
            Ok(out)
        })
    }

    // -- Channels --

    /// Insert-or-overwrite each channel by id, transactionally.
    ///
    /// Overwrites replace `title`/`description`/`avatar` and the permission
    /// list; `created_at` and the local `enabled` flag keep their first-stored
    /// values. Permission order is preserved on readback.
    pub fn upsert_channels(&self, channels: &[Channel]) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut upsert = tx.prepare_cached(UPSERT_CHANNEL)?;
                let mut drop_perms =
                    tx.prepare_cached("DELETE FROM channel_permissions WHERE channel = ?1")?;
                let mut add_perm = tx.prepare_cached(
                    "INSERT INTO channel_permissions (channel, seq, permission)
                     VALUES (?1, ?2, ?3)",
                )?;
                for c in channels {
                    upsert
                        .execute(params![
                            c.id as i64,
                            c.title,
                            c.description,
                            c.avatar,
                            c.created_at.secs as i64,
                            c.created_at.nanos,
                            c.enabled,
                        ])
                        .map_err(classify_write)?;
                    drop_perms.execute(params![c.id as i64])?;
                    for (seq, permission) in c.permissions.iter().enumerate() {
                        add_perm.execute(params![c.id as i64, seq as i64, permission])?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Every cached channel, ordered by id, permissions in stored order.
    pub fn get_channels(&self) -> Result<Vec<Channel>, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

            let rows = {
                let mut stmt = tx.prepare_cached(
                    "SELECT id, title, description, avatar, created_at, created_ns, enabled
                     FROM channels
                     ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(ChannelRow {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            description: row.get(2)?,
                            avatar: row.get(3)?,
                            secs: row.get(4)?,
                            ns: row.get(5)?,
                            enabled: row.get(6)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };

            let mut perms: HashMap<i64, Vec<u16>> = HashMap::new();
            {
                let mut stmt = tx.prepare_cached(
                    "SELECT channel, permission FROM channel_permissions ORDER BY channel, seq",
                )?;
                let pairs = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, u16>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                for (chan, permission) in pairs {
                    perms.entry(chan).or_default().push(permission);
                }
            }

            Ok(rows
                .into_iter()
                .map(|r| Channel {
                    id: r.id as u64,
                    title: r.title,
                    description: r.description,
                    avatar: r.avatar,
                    created_at: Timestamp {
                        secs: r.secs as u64,
                        nanos: r.ns,
                    },
                    enabled: r.enabled,
                    permissions: perms.remove(&r.id).unwrap_or_default(),
                })
                .collect())
        })
    }

    /// Flip the local "subscribed" flag. Returns whether the channel existed.
    /// Sync merges never touch this flag.
    pub fn set_channel_enabled(&self, channel: u64, enabled: bool) -> Result<bool, StoreError> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE channels SET enabled = ?2 WHERE id = ?1",
                params![channel as i64, enabled],
            )?;
            Ok(changed > 0)
        })
    }
}

struct MessageRow {
    id: i64,
    sender: i64,
    flags: u32,
    body: Option<String>,
    tag: i64,
    secs: i64,
    ns: u32,
    reply: i64,
}

struct ChannelRow {
    id: i64,
    title: String,
    description: Option<String>,
    avatar: Option<String>,
    secs: i64,
    ns: u32,
    enabled: bool,
}

fn query_message_rows(
    conn: &Connection,
    channel: u64,
    amount: usize,
) -> Result<Vec<MessageRow>, StoreError> {
    let limit = i64::try_from(amount).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare_cached(
        "SELECT id, sender, flags, body, media_tag, sent_at, sent_ns, reply_id
         FROM messages
         WHERE channel = ?1
         ORDER BY sent_at DESC, sent_ns DESC, rowid DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![channel as i64, limit], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                sender: row.get(1)?,
                flags: row.get(2)?,
                body: row.get(3)?,
                tag: row.get(4)?,
                secs: row.get(5)?,
                ns: row.get(6)?,
                reply: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Batch-fetch media rows for every message in `rows` that carries media,
/// grouped by message id in `seq` order.
fn query_media_rows(
    conn: &Connection,
    channel: u64,
    rows: &[MessageRow],
) -> Result<HashMap<i64, Vec<MediaItem>>, StoreError> {
    let mut by_message: HashMap<i64, Vec<MediaItem>> = HashMap::new();
    let ids: Vec<i64> = rows
        .iter()
        .filter(|r| r.tag != media::TAG_NONE)
        .map(|r| r.id)
        .collect();
    if ids.is_empty() {
        return Ok(by_message);
    }

    let placeholders: Vec<String> = (2..ids.len() + 2).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT message_id, kind, path, preview, pos_x, pos_y, span_x, span_y
         FROM message_media
         WHERE channel = ?1 AND message_id IN ({})
         ORDER BY message_id, seq",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let chan = channel as i64;
    let mut bound: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(ids.len() + 1);
    bound.push(&chan);
    for id in &ids {
        bound.push(id);
    }

    let items = stmt
        .query_map(bound.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, u8>(4)?,
                row.get::<_, u8>(5)?,
                row.get::<_, u8>(6)?,
                row.get::<_, u8>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (message_id, kind_code, path, preview, x, y, span_x, span_y) in items {
        let kind = MediaKind::from_code(kind_code).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "message {message_id}: unknown media kind {kind_code}"
            ))
        })?;
        by_message.entry(message_id).or_default().push(MediaItem {
            kind,
            path,
            preview,
            coordinates: MediaCoordinates {
                x,
                y,
                span_x,
                span_y,
            },
        });
    }
    Ok(by_message)
}
