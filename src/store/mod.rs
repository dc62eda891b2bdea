use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};
use thiserror::Error;

/// Content-addressed blob storage behind a narrow trait.
pub mod blobs;
/// Read-only catalog queries.
pub mod read;
/// SQLite schema management for the catalog database.
pub mod schema;
/// Write-focused helpers, all scoped to a [`CatalogWriteBatch`].
pub mod write;

mod settings;
mod util;

pub use blobs::BlobStore;
pub use read::CatalogCounts;
pub use write::FileWrite;

/// Metadata key holding the epoch of the most recent committed scan.
pub const META_SCAN_EPOCH: &str = "scan_epoch";
/// Metadata key holding the JSON report of the most recent committed scan.
pub const META_LAST_RUN: &str = "last_run";

/// One row per distinct filesystem path ever observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path as walked; the unique key.
    pub path: String,
    /// Lowercase extension without the dot, empty when the file has none.
    pub extension: String,
    pub size_bytes: u64,
    /// Modification time in unix seconds.
    pub mtime: i64,
    /// Hex SHA-256 of the content, empty until the first successful hash.
    pub content_hash: String,
    pub first_seen: i64,
    pub last_seen: i64,
    /// Set when the path was absent from the most recent pass.
    pub deleted_at: Option<i64>,
    /// Scan epoch of the run that last observed the path.
    pub seen_epoch: i64,
}

#[cfg(test)]
impl FileRecord {
    pub(crate) fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Stored prefix of a file's content, keyed by its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRecord {
    pub content_hash: String,
    /// Captured bytes, at most the configured cap.
    pub content: Vec<u8>,
    /// Full size of the file the blob was taken from.
    pub size_bytes: u64,
    pub created_at: i64,
}

/// Errors returned by the catalog store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite query failed.
    #[error("Database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    /// Failed to create the database's parent directory.
    #[error("Could not write to {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// A stored JSON value could not be encoded or decoded.
    #[error("Invalid stored value for {key}: {source}")]
    Json {
        /// Settings or metadata key.
        key: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A metadata value the job depends on could not be parsed.
    #[error("Corrupt metadata value for {key}: {value:?}")]
    InvalidMetadata {
        /// Metadata key.
        key: String,
        /// Raw stored value.
        value: String,
    },
    /// Database is locked or busy.
    #[error("Database is busy, please retry")]
    Busy,
    /// SQLite returned an unexpected result.
    #[error("SQLite returned an unexpected result")]
    Unexpected,
}

/// SQLite wrapper holding the file catalog, blobs, settings, and job metadata.
pub struct CatalogDatabase {
    connection: Connection,
}

/// Groups every write of one scan into a single transaction.
///
/// Dropping the batch without calling [`CatalogWriteBatch::commit`] rolls the
/// whole run back.
pub struct CatalogWriteBatch<'conn> {
    tx: Transaction<'conn>,
}

impl CatalogDatabase {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        util::create_parent_if_needed(path)?;
        let connection = Connection::open(path).map_err(util::map_sql_error)?;
        let db = Self { connection };
        db.apply_pragmas()?;
        schema::apply_schema(&db.connection)?;
        Ok(db)
    }

    /// Start a write batch that wraps related mutations in a single transaction.
    pub fn write_batch(&self) -> Result<CatalogWriteBatch<'_>, StoreError> {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(util::map_sql_error)?;
        Ok(CatalogWriteBatch { tx })
    }

    fn apply_pragmas(&self) -> Result<(), StoreError> {
        self.connection
            .execute_batch(
                "PRAGMA journal_mode=WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
            )
            .map_err(util::map_sql_error)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;
    use tempfile::tempdir;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        CatalogDatabase::open(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn applies_workload_pragmas_and_indices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let _db = CatalogDatabase::open(&path).unwrap();
        let conn = Connection::open(&path).unwrap();

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        for name in [
            "idx_catalog_files_last_seen",
            "idx_catalog_files_content_hash",
            "idx_catalog_files_deleted_at",
            "idx_catalog_files_seen_epoch",
        ] {
            let idx: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type='index' AND name=?1",
                    [name],
                    |row| row.get(0),
                )
                .optional()
                .unwrap();
            assert_eq!(idx.as_deref(), Some(name));
        }
    }

    #[test]
    fn dropped_batch_rolls_back() {
        let dir = tempdir().unwrap();
        let db = CatalogDatabase::open(dir.path().join("catalog.db")).unwrap();
        {
            let mut batch = db.write_batch().unwrap();
            batch
                .insert_file(&write::FileWrite {
                    path: "/data/a.txt",
                    extension: "txt",
                    size_bytes: 1,
                    mtime: 1,
                    content_hash: "abc",
                    seen_at: 10,
                    epoch: 1,
                })
                .unwrap();
        }
        assert_eq!(db.count_files().unwrap(), 0);
    }
}
