pub mod error;
mod media;
mod queries;
pub mod schema;

pub use error::StoreError;

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::Connection;
use tracing::info;

const READER_POOL_SIZE: usize = 4;

/// Local cache store with a reader/writer split: one writer connection
/// serializes every mutation, a small pool of read-only connections lets
/// queries run concurrently. WAL keeps readers unblocked by the writer.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    /// Open (creating if missing) the store at `path`.
    ///
    /// Tables are not created here — call [`Database::create_schema`] once
    /// after opening.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let open_err = |source: rusqlite::Error| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };

        let writer = Connection::open(path).map_err(open_err)?;
        writer
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(open_err)?;
        writer
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(open_err)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(open_err)?;
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(open_err)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "store opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Idempotently ensure all tables and indices exist.
    pub fn create_schema(&self) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| schema::create(conn))
    }

    /// Empty every managed table in one transaction.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.with_conn_mut(schema::clear)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let mut conn = self.readers[idx].lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut conn)
    }

    pub(crate) fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut conn)
    }
}
