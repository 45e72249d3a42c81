//! Durable slots - the persisted mirror of the history log
//!
//! A slot is a single named key in local storage. The history store writes its
//! whole list to the slot after every mutation and reads it back once at
//! startup. Three backends are provided: an in-process cell, a JSON file and a
//! SQLite key/value table.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Default key of the history slot
pub const DEFAULT_SLOT_KEY: &str = "state_history";

/// SQLite database file name inside the data directory
pub const SQLITE_FILE: &str = "freshline.db";

/// Errors raised by slot backends
#[derive(Debug, Error, miette::Diagnostic)]
pub enum SlotError {
    #[error("IO error on slot {key}: {source}")]
    #[diagnostic(code(freshline::slot::io))]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error on slot {key}: {source}")]
    #[diagnostic(code(freshline::slot::sqlite))]
    Sqlite {
        key: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage quota exceeded for slot {key}")]
    #[diagnostic(code(freshline::slot::quota))]
    QuotaExceeded { key: String },
}

/// A single named location in local persistent storage
pub trait DurableSlot: Send {
    /// Name of the slot
    fn key(&self) -> &str;

    /// Read the whole slot, `None` if it was never written
    fn read(&self) -> Result<Option<String>, SlotError>;

    /// Overwrite the whole slot
    fn write(&mut self, contents: &str) -> Result<(), SlotError>;
}

// =========================================================================
// MemorySlot
// =========================================================================

#[derive(Debug, Default)]
struct MemoryCell {
    contents: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-process slot
///
/// Clones share the same cell, which lets a second store reopen what a first
/// store persisted.
#[derive(Debug, Clone)]
pub struct MemorySlot {
    key: String,
    cell: Arc<Mutex<MemoryCell>>,
}

impl MemorySlot {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cell: Arc::new(Mutex::new(MemoryCell::default())),
        }
    }

    /// Create a slot that already holds `contents`
    pub fn with_contents(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let slot = Self::new(key);
        slot.cell.lock().contents = Some(contents.into());
        slot
    }

    /// Make subsequent writes fail with `QuotaExceeded`
    pub fn set_fail_writes(&self, fail: bool) {
        self.cell.lock().fail_writes = fail;
    }

    /// Current raw contents
    pub fn contents(&self) -> Option<String> {
        self.cell.lock().contents.clone()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.cell.lock().writes
    }
}

impl Default for MemorySlot {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_KEY)
    }
}

impl DurableSlot for MemorySlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>, SlotError> {
        Ok(self.cell.lock().contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), SlotError> {
        let mut cell = self.cell.lock();
        if cell.fail_writes {
            return Err(SlotError::QuotaExceeded {
                key: self.key.clone(),
            });
        }
        cell.contents = Some(contents.to_string());
        cell.writes += 1;
        Ok(())
    }
}

// =========================================================================
// FileSlot
// =========================================================================

/// Slot stored as `<dir>/<key>.json`
///
/// Writes land in a temporary sibling first and are renamed into place.
#[derive(Debug)]
pub struct FileSlot {
    key: String,
    path: PathBuf,
}

impl FileSlot {
    /// Open a slot in `dir`, creating the directory if needed
    pub fn open(dir: &Path, key: impl Into<String>) -> Result<Self, SlotError> {
        let key = key.into();
        fs::create_dir_all(dir).map_err(|source| SlotError::Io {
            key: key.clone(),
            source,
        })?;
        let path = dir.join(format!("{}.json", key));
        Ok(Self { key, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SlotError {
        SlotError::Io {
            key: self.key.clone(),
            source,
        }
    }
}

impl DurableSlot for FileSlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), SlotError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

// =========================================================================
// SqliteSlot
// =========================================================================

/// Slot stored as one row of a SQLite key/value table
pub struct SqliteSlot {
    key: String,
    conn: Connection,
}

impl SqliteSlot {
    /// Open `<dir>/freshline.db` and ensure the slots table exists
    pub fn open(dir: &Path, key: impl Into<String>) -> Result<Self, SlotError> {
        let key = key.into();
        fs::create_dir_all(dir).map_err(|source| SlotError::Io {
            key: key.clone(),
            source,
        })?;
        let conn = Connection::open(dir.join(SQLITE_FILE)).map_err(|source| SlotError::Sqlite {
            key: key.clone(),
            source,
        })?;
        Self::with_connection(conn, key)
    }

    /// Use an existing connection (e.g. `Connection::open_in_memory()`)
    pub fn with_connection(conn: Connection, key: impl Into<String>) -> Result<Self, SlotError> {
        let key = key.into();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|source| SlotError::Sqlite {
            key: key.clone(),
            source,
        })?;
        Ok(Self { key, conn })
    }

    fn sql_err(&self, source: rusqlite::Error) -> SlotError {
        SlotError::Sqlite {
            key: self.key.clone(),
            source,
        }
    }
}

impl DurableSlot for SqliteSlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>, SlotError> {
        self.conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| self.sql_err(e))
    }

    fn write(&mut self, contents: &str) -> Result<(), SlotError> {
        self.conn
            .execute(
                "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![self.key, contents, Utc::now().to_rfc3339()],
            )
            .map(|_| ())
            .map_err(|e| self.sql_err(e))
    }
}
