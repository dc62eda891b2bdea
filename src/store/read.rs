use rusqlite::{OptionalExtension, Row, params};

use super::util::map_sql_error;
use super::{BlobRecord, CatalogDatabase, CatalogWriteBatch, FileRecord, META_SCAN_EPOCH, StoreError};

pub(super) const FILE_COLUMNS: &str = "path, extension, size_bytes, mtime, content_hash,
     first_seen, last_seen, deleted_at, seen_epoch";

pub(super) fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        extension: row.get(1)?,
        size_bytes: row.get::<_, i64>(2)?.max(0) as u64,
        mtime: row.get(3)?,
        content_hash: row.get(4)?,
        first_seen: row.get(5)?,
        last_seen: row.get(6)?,
        deleted_at: row.get(7)?,
        seen_epoch: row.get(8)?,
    })
}

/// Totals shown by the status command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub total_files: u64,
    pub live_files: u64,
    pub deleted_files: u64,
    pub blob_count: u64,
    pub blob_bytes: u64,
}

impl CatalogDatabase {
    /// Fetch a single record by exact path.
    pub fn get_file(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM catalog_files WHERE path = ?1");
        self.connection
            .query_row(&sql, params![path], file_from_row)
            .optional()
            .map_err(map_sql_error)
    }

    /// Fetch every record, live and soft-deleted, ordered by path.
    #[cfg(test)]
    pub(crate) fn list_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM catalog_files ORDER BY path ASC");
        let mut stmt = self.connection.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], file_from_row)
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    /// Paths currently marked deleted.
    #[cfg(test)]
    pub(crate) fn list_deleted_paths(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .connection
            .prepare("SELECT path FROM catalog_files WHERE deleted_at IS NOT NULL ORDER BY path")
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    /// Number of records, including soft-deleted ones.
    pub fn count_files(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM catalog_files", [], |row| row.get(0))
            .map_err(map_sql_error)?;
        Ok(count.max(0) as u64)
    }

    pub fn counts(&self) -> Result<CatalogCounts, StoreError> {
        let (total, deleted): (i64, i64) = self
            .connection
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(deleted_at IS NOT NULL), 0) FROM catalog_files",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(map_sql_error)?;
        let (blob_count, blob_bytes): (i64, i64) = self
            .connection
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(length(content)), 0) FROM catalog_blobs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(map_sql_error)?;
        Ok(CatalogCounts {
            total_files: total.max(0) as u64,
            live_files: (total - deleted).max(0) as u64,
            deleted_files: deleted.max(0) as u64,
            blob_count: blob_count.max(0) as u64,
            blob_bytes: blob_bytes.max(0) as u64,
        })
    }

    pub fn get_blob(&self, content_hash: &str) -> Result<Option<BlobRecord>, StoreError> {
        self.connection
            .query_row(
                "SELECT content_hash, content, size_bytes, created_at
                 FROM catalog_blobs WHERE content_hash = ?1",
                params![content_hash],
                |row| {
                    Ok(BlobRecord {
                        content_hash: row.get(0)?,
                        content: row.get(1)?,
                        size_bytes: row.get::<_, i64>(2)?.max(0) as u64,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(map_sql_error)
    }

    /// Read a raw metadata value.
    pub fn metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.connection
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)
    }

    /// Epoch of the most recent committed scan, zero before the first one.
    pub fn scan_epoch(&self) -> Result<i64, StoreError> {
        parse_epoch(self.metadata(META_SCAN_EPOCH)?)
    }
}

impl CatalogWriteBatch<'_> {
    /// Look up a record by exact path inside the running transaction.
    pub fn file_by_path(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM catalog_files WHERE path = ?1");
        self.tx
            .prepare_cached(&sql)
            .map_err(map_sql_error)?
            .query_row(params![path], file_from_row)
            .optional()
            .map_err(map_sql_error)
    }

    /// Epoch of the last committed scan as seen from inside the transaction.
    pub fn scan_epoch(&self) -> Result<i64, StoreError> {
        let value: Option<String> = self
            .tx
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![META_SCAN_EPOCH],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?;
        parse_epoch(value)
    }
}

/// A stored epoch that is not a non-negative integer is an error, never zero.
fn parse_epoch(value: Option<String>) -> Result<i64, StoreError> {
    let Some(value) = value else {
        return Ok(0);
    };
    match value.trim().parse::<i64>() {
        Ok(epoch) if epoch >= 0 => Ok(epoch),
        _ => Err(StoreError::InvalidMetadata {
            key: META_SCAN_EPOCH.to_string(),
            value,
        }),
    }
}
