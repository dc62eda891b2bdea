//! Application directory helpers anchored to a single `.agenthive` folder.
//!
//! The database, the optional TOML settings file, and log files all live
//! under the OS config directory unless `AGENTHIVE_CONFIG_HOME` points
//! somewhere else (tests, portable installs, containers).

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".agenthive";
/// Environment variable replacing the OS config root.
pub const CONFIG_HOME_ENV: &str = "AGENTHIVE_CONFIG_HOME";
/// File name of the default catalog database.
pub const DATABASE_FILE_NAME: &str = "catalog.db";
/// File name of the default settings file.
pub const SETTINGS_FILE_NAME: &str = "catalog.toml";

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `.agenthive` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Return the logs directory inside the app root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

/// Default location of the catalog database.
pub fn default_database_path() -> Result<PathBuf, AppDirError> {
    Ok(app_root_dir()?.join(DATABASE_FILE_NAME))
}

/// Default location of the TOML settings file; the file itself is optional.
pub fn default_settings_path() -> Result<PathBuf, AppDirError> {
    Ok(app_root_dir()?.join(SETTINGS_FILE_NAME))
}

fn config_base_dir() -> Option<PathBuf> {
    resolve_base(std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
}

fn resolve_base(override_dir: Option<PathBuf>) -> Option<PathBuf> {
    override_dir
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    create_dir(&path)?;
    Ok(path)
}

fn create_dir(path: &Path) -> Result<(), AppDirError> {
    std::fs::create_dir_all(path).map_err(|source| AppDirError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn override_replaces_os_config_dir() {
        let base = tempdir().unwrap();
        let resolved = resolve_base(Some(base.path().to_path_buf()));
        assert_eq!(resolved.as_deref(), Some(base.path()));
    }

    #[test]
    fn empty_override_is_ignored() {
        assert_eq!(
            resolve_base(Some(PathBuf::new())),
            BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
        );
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let base = tempdir().unwrap();
        let path = ensure_dir(base.path().join(APP_DIR_NAME).join("logs")).unwrap();
        assert!(path.is_dir());
    }
}
