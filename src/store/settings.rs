use rusqlite::{OptionalExtension, params};

use super::util::map_sql_error;
use super::{CatalogDatabase, StoreError};

impl CatalogDatabase {
    /// Raw stored text for a settings key.
    pub fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.connection
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)
    }

    /// All stored settings ordered by key.
    pub fn list_settings(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self
            .connection
            .prepare("SELECT key, value FROM settings ORDER BY key ASC")
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Remove a setting; returns false when it was not set.
    pub fn unset_setting(&self, key: &str) -> Result<bool, StoreError> {
        let removed = self
            .connection
            .execute("DELETE FROM settings WHERE key = ?1", params![key])
            .map_err(map_sql_error)?;
        Ok(removed > 0)
    }
}
