use rusqlite::{OptionalExtension, params};

use super::util::map_sql_error;
use super::{CatalogWriteBatch, StoreError};

/// Content-addressed sink for file content, keyed by digest.
///
/// Blobs are write-once: a digest that already has a blob is never rewritten.
pub trait BlobStore {
    /// True when a blob for `content_hash` already exists.
    fn contains_blob(&self, content_hash: &str) -> Result<bool, StoreError>;

    /// Store `content` under `content_hash` unless a blob already exists.
    ///
    /// Returns true when a new blob was written.
    fn put_blob(
        &mut self,
        content_hash: &str,
        content: &[u8],
        size_bytes: u64,
        created_at: i64,
    ) -> Result<bool, StoreError>;
}

impl BlobStore for CatalogWriteBatch<'_> {
    fn contains_blob(&self, content_hash: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .tx
            .prepare_cached("SELECT 1 FROM catalog_blobs WHERE content_hash = ?1")
            .map_err(map_sql_error)?
            .query_row(params![content_hash], |row| row.get(0))
            .optional()
            .map_err(map_sql_error)?;
        Ok(found.is_some())
    }

    fn put_blob(
        &mut self,
        content_hash: &str,
        content: &[u8],
        size_bytes: u64,
        created_at: i64,
    ) -> Result<bool, StoreError> {
        let written = self
            .tx
            .prepare_cached(
                "INSERT INTO catalog_blobs (content_hash, content, size_bytes, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(content_hash) DO NOTHING",
            )
            .map_err(map_sql_error)?
            .execute(params![content_hash, content, size_bytes as i64, created_at])
            .map_err(map_sql_error)?;
        Ok(written == 1)
    }
}
