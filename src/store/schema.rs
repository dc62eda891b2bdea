use std::collections::HashSet;

use rusqlite::Connection;

use super::StoreError;
use super::util::map_sql_error;

pub(super) fn apply_schema(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
             CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
             CREATE TABLE IF NOT EXISTS catalog_files (
                path TEXT PRIMARY KEY,
                extension TEXT NOT NULL DEFAULT '',
                size_bytes INTEGER NOT NULL,
                mtime INTEGER NOT NULL,
                content_hash TEXT NOT NULL DEFAULT '',
                first_seen INTEGER NOT NULL,
                last_seen INTEGER NOT NULL
            );
             CREATE TABLE IF NOT EXISTS catalog_blobs (
                content_hash TEXT PRIMARY KEY,
                content BLOB NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            ) WITHOUT ROWID;",
        )
        .map_err(map_sql_error)?;
    ensure_catalog_files_optional_columns(connection)?;
    connection
        .execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_catalog_files_last_seen
                 ON catalog_files (last_seen);
             CREATE INDEX IF NOT EXISTS idx_catalog_files_content_hash
                 ON catalog_files (content_hash);
             CREATE INDEX IF NOT EXISTS idx_catalog_files_deleted_at
                 ON catalog_files (deleted_at);
             CREATE INDEX IF NOT EXISTS idx_catalog_files_seen_epoch
                 ON catalog_files (seen_epoch);",
        )
        .map_err(map_sql_error)?;
    Ok(())
}

/// Columns added after the first release are patched onto older databases.
fn ensure_catalog_files_optional_columns(connection: &Connection) -> Result<(), StoreError> {
    let mut stmt = connection
        .prepare("PRAGMA table_info(catalog_files)")
        .map_err(map_sql_error)?;
    let columns: HashSet<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(map_sql_error)?
        .filter_map(Result::ok)
        .collect();
    if !columns.contains("deleted_at") {
        connection
            .execute("ALTER TABLE catalog_files ADD COLUMN deleted_at INTEGER", [])
            .map_err(map_sql_error)?;
    }
    if !columns.contains("seen_epoch") {
        connection
            .execute(
                "ALTER TABLE catalog_files ADD COLUMN seen_epoch INTEGER NOT NULL DEFAULT 0",
                [],
            )
            .map_err(map_sql_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CatalogDatabase;
    use tempfile::tempdir;

    #[test]
    fn missing_columns_are_added_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(
                "CREATE TABLE catalog_files (
                    path TEXT PRIMARY KEY,
                    extension TEXT NOT NULL DEFAULT '',
                    size_bytes INTEGER NOT NULL,
                    mtime INTEGER NOT NULL,
                    content_hash TEXT NOT NULL DEFAULT '',
                    first_seen INTEGER NOT NULL,
                    last_seen INTEGER NOT NULL
                )",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO catalog_files
                    (path, extension, size_bytes, mtime, content_hash, first_seen, last_seen)
                 VALUES ('/old/a.txt', 'txt', 3, 5, 'abc', 7, 7)",
                [],
            )
            .unwrap();
        }
        let db = CatalogDatabase::open(&path).unwrap();
        let record = db.get_file("/old/a.txt").unwrap().unwrap();
        assert_eq!(record.deleted_at, None);
        assert_eq!(record.seen_epoch, 0);
        assert_eq!(record.content_hash, "abc");
    }

    #[test]
    fn applying_schema_twice_is_harmless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        drop(CatalogDatabase::open(&path).unwrap());
        let db = CatalogDatabase::open(&path).unwrap();
        apply_schema(db.connection()).unwrap();
        assert_eq!(db.count_files().unwrap(), 0);
    }
}
