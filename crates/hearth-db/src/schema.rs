use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Create every table and index the cache uses. `IF NOT EXISTS` throughout,
/// so re-running against an existing store is a no-op (and repairs a store
/// that lost a table).
pub fn create(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS channels (
            id          INTEGER PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT,
            avatar      TEXT,
            created_at  INTEGER NOT NULL,
            created_ns  INTEGER NOT NULL,
            enabled     INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS channel_permissions (
            channel     INTEGER NOT NULL REFERENCES channels(id),
            seq         INTEGER NOT NULL,
            permission  INTEGER NOT NULL,
            PRIMARY KEY (channel, seq)
        );

        CREATE TABLE IF NOT EXISTS messages (
            channel     INTEGER NOT NULL,
            id          INTEGER NOT NULL,
            sender      INTEGER NOT NULL,
            flags       INTEGER NOT NULL,
            body        TEXT,
            media_tag   INTEGER NOT NULL DEFAULT 0,
            sent_at     INTEGER NOT NULL,
            sent_ns     INTEGER NOT NULL,
            reply_id    INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (channel, id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_channel_time
            ON messages(channel, sent_at, sent_ns);

        CREATE TABLE IF NOT EXISTS message_media (
            channel     INTEGER NOT NULL,
            message_id  INTEGER NOT NULL,
            seq         INTEGER NOT NULL,
            kind        INTEGER NOT NULL,
            path        TEXT NOT NULL,
            preview     TEXT,
            pos_x       INTEGER NOT NULL,
            pos_y       INTEGER NOT NULL,
            span_x      INTEGER NOT NULL,
            span_y      INTEGER NOT NULL,
            PRIMARY KEY (channel, message_id, seq),
            FOREIGN KEY (channel, message_id) REFERENCES messages(channel, id)
        );
        ",
    )?;

    info!("store schema ensured");
    Ok(())
}

/// Delete every row from every managed table, atomically. Children first so
/// foreign keys hold at each step; one transaction so a failure leaves the
/// store exactly as it was.
pub fn clear(conn: &mut Connection) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "
        DELETE FROM message_media;
        DELETE FROM messages;
        DELETE FROM channel_permissions;
        DELETE FROM channels;
        ",
    )?;
    tx.commit()?;

    info!("store cleared");
    Ok(())
}
