use rusqlite::params;

use super::util::map_sql_error;
use super::{CatalogWriteBatch, META_SCAN_EPOCH, StoreError};

/// Column values written for an inserted or updated record.
#[derive(Debug, Clone, Copy)]
pub struct FileWrite<'a> {
    pub path: &'a str,
    pub extension: &'a str,
    pub size_bytes: u64,
    pub mtime: i64,
    pub content_hash: &'a str,
    /// Start time of the run performing the write.
    pub seen_at: i64,
    pub epoch: i64,
}

impl CatalogWriteBatch<'_> {
    /// Create a record observed for the first time.
    pub fn insert_file(&mut self, file: &FileWrite<'_>) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "INSERT INTO catalog_files
                    (path, extension, size_bytes, mtime, content_hash,
                     first_seen, last_seen, deleted_at, seen_epoch)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, NULL, ?7)",
            )
            .map_err(map_sql_error)?
            .execute(params![
                file.path,
                file.extension,
                file.size_bytes as i64,
                file.mtime,
                file.content_hash,
                file.seen_at,
                file.epoch
            ])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Rewrite metadata and hash of a known record, preserving `first_seen`.
    pub fn update_file(&mut self, file: &FileWrite<'_>) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "UPDATE catalog_files
                 SET extension = ?2, size_bytes = ?3, mtime = ?4, content_hash = ?5,
                     last_seen = ?6, deleted_at = NULL, seen_epoch = ?7
                 WHERE path = ?1",
            )
            .map_err(map_sql_error)?
            .execute(params![
                file.path,
                file.extension,
                file.size_bytes as i64,
                file.mtime,
                file.content_hash,
                file.seen_at,
                file.epoch
            ])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Mark an unchanged record as seen in this pass.
    pub fn touch_file(&mut self, path: &str, seen_at: i64, epoch: i64) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "UPDATE catalog_files
                 SET last_seen = ?2, deleted_at = NULL, seen_epoch = ?3
                 WHERE path = ?1",
            )
            .map_err(map_sql_error)?
            .execute(params![path, seen_at, epoch])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Soft-delete every live record not stamped with `epoch`.
    ///
    /// Returns the number of records newly marked.
    pub fn sweep_unseen(&mut self, epoch: i64, deleted_at: i64) -> Result<usize, StoreError> {
        self.tx
            .prepare_cached(
                "UPDATE catalog_files
                 SET deleted_at = ?2
                 WHERE deleted_at IS NULL AND seen_epoch < ?1",
            )
            .map_err(map_sql_error)?
            .execute(params![epoch, deleted_at])
            .map_err(map_sql_error)
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .map_err(map_sql_error)?
            .execute(params![key, value])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Persist the epoch of the scan this batch belongs to.
    pub fn set_scan_epoch(&mut self, epoch: i64) -> Result<(), StoreError> {
        self.set_metadata(META_SCAN_EPOCH, &epoch.to_string())
    }

    /// Commit all batched operations atomically.
    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(map_sql_error)
    }
}
