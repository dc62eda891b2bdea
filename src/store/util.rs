use std::path::Path;

use super::StoreError;

/// Translate rusqlite errors into friendlier StoreError variants.
pub(super) fn map_sql_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(sql_err, _)
            if sql_err.code == rusqlite::ErrorCode::DatabaseBusy
                || sql_err.code == rusqlite::ErrorCode::DatabaseLocked =>
        {
            StoreError::Busy
        }
        rusqlite::Error::InvalidQuery
        | rusqlite::Error::InvalidParameterName(_)
        | rusqlite::Error::MultipleStatement => StoreError::Unexpected,
        other => StoreError::Sql(other),
    }
}

pub(super) fn create_parent_if_needed(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn busy_failures_map_to_busy() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None);
        assert!(matches!(map_sql_error(err), StoreError::Busy));
    }

    #[test]
    fn other_failures_keep_the_sql_error() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(map_sql_error(err), StoreError::Sql(_)));
    }

    #[test]
    fn bare_file_names_need_no_parent() {
        create_parent_if_needed(Path::new("catalog.db")).unwrap();
    }
}
