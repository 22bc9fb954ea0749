//! C4 — the persistent SQLite index: one file, WAL journaling, a single
//! writer lane, and an FTS5 mirror kept in lockstep with `symbols`
//! (spec.md §4.3).

mod integrity;
mod queries;
mod schema;
mod write;

pub use integrity::{IntegrityReport, OrphanKind};
pub use queries::SymbolFilter;

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("schema version mismatch: index has {found}, expected {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("integrity violation: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A handle to the index. Writers serialize through the internal mutex
/// (the "single logical writer" spec.md §4.3 and §5 require); readers that
/// only issue `SELECT`s may call through the same handle since SQLite's WAL
/// mode lets one writer and many readers coexist at the file level — the
/// mutex here bounds in-process contention, not cross-process concurrency.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if absent) the database at `path`, enables WAL, and
    /// applies the schema, checking `metadata.schema_version` if the file
    /// already existed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, for tests: same schema, no file, no WAL (SQLite
    /// ignores WAL requests against `:memory:`).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn configure(conn: &Connection) -> StoreResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(())
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(schema::DDL)?;
        let existing: Option<i64> = conn
            .query_row("SELECT value FROM metadata WHERE key = 'schema_version'", [], |row| {
                row.get::<_, String>(0)
            })
            .ok()
            .and_then(|s| s.parse().ok());
        match existing {
            None => {
                conn.execute(
                    "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)",
                    [schema::SCHEMA_VERSION.to_string()],
                )?;
            }
            Some(found) if found != schema::SCHEMA_VERSION => {
                return Err(StoreError::SchemaMismatch {
                    found,
                    expected: schema::SCHEMA_VERSION,
                });
            }
            Some(_) => {}
        }
        Ok(())
    }

    pub fn get_metadata(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        match conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| row.get(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    /// Checkpoints the WAL back into the main database file. Call after a
    /// bulk write so disk usage doesn't balloon before the next natural
    /// checkpoint.
    pub fn checkpoint(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.pragma_update(None, "wal_checkpoint", "TRUNCATE")?;
        Ok(())
    }

    pub fn file_size_bytes(&self, db_path: &Path) -> u64 {
        std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0)
    }

    pub fn count_files(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_stamps_schema_version() {
        let store = Store::open_in_memory().unwrap();
        let version = store.get_metadata("schema_version").unwrap();
        assert_eq!(version, Some(schema::SCHEMA_VERSION.to_string()));
    }

    #[test]
    fn metadata_round_trips() {
        let store = Store::open_in_memory().unwrap();
        store.set_metadata("git_commit", "abc123").unwrap();
        assert_eq!(store.get_metadata("git_commit").unwrap(), Some("abc123".to_string()));
        store.set_metadata("git_commit", "def456").unwrap();
        assert_eq!(store.get_metadata("git_commit").unwrap(), Some("def456".to_string()));
    }
}
