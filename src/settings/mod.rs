//! Typed catalog configuration loaded from a key-value settings store.
//!
//! Settings arrive loosely typed (JSON values from the database, TOML values
//! from a file, strings from the command line). All coercion happens here, at
//! load time, so the scan itself only ever sees a validated [`CatalogConfig`].

use std::path::PathBuf;

use thiserror::Error;

mod coerce;
pub mod defaults;
mod load;
mod source;

pub use load::{ConfigOverrides, PartialConfig};
pub use source::{LayeredSettings, SettingsStore, TomlSettings};

use crate::store::StoreError;

/// Settings key for the directory to walk.
pub const KEY_SCAN_PATH: &str = "scan_path";
/// Settings key for the extension allow-list.
pub const KEY_FILE_TYPES: &str = "file_types";
/// Older alias of [`KEY_FILE_TYPES`].
pub const KEY_EXTENSIONS: &str = "extensions";
/// Settings key for pruned directory basenames.
pub const KEY_SKIP_DIR_NAMES: &str = "skip_dir_names";
/// Settings key for the blob storage toggle.
pub const KEY_STORE_BLOBS: &str = "store_blobs";
/// Settings key for the per-blob size cap in KiB.
pub const KEY_MAX_BLOB_KB: &str = "max_blob_kb";

/// Every key the catalog recognizes.
pub const KNOWN_KEYS: &[&str] = &[
    KEY_SCAN_PATH,
    KEY_FILE_TYPES,
    KEY_EXTENSIONS,
    KEY_SKIP_DIR_NAMES,
    KEY_STORE_BLOBS,
    KEY_MAX_BLOB_KB,
];

/// Validated configuration for one catalog run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Absolute directory to walk.
    pub scan_path: PathBuf,
    /// Allowed lowercase extensions; empty allows every file.
    pub file_types: Vec<String>,
    /// Directory basenames pruned together with their subtree.
    pub skip_dir_names: Vec<String>,
    pub store_blobs: bool,
    pub max_blob_kb: u32,
}

impl CatalogConfig {
    /// Resolve settings from `store`, apply overrides, and validate.
    pub fn load(
        store: &dyn SettingsStore,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut partial = PartialConfig::from_settings(store)?;
        overrides.apply(&mut partial);
        partial.validate()
    }

    /// Blob cap in bytes.
    pub fn max_blob_bytes(&self) -> usize {
        self.max_blob_kb as usize * 1024
    }

    /// True when a file with `extension` passes the allow-list.
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.file_types.is_empty() || self.file_types.iter().any(|allowed| allowed == extension)
    }

    /// True when a directory with basename `name` must not be entered.
    pub fn skips_dir(&self, name: &str) -> bool {
        self.skip_dir_names.iter().any(|skip| skip == name)
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No scan path was configured.
    #[error("scan_path is not configured")]
    MissingScanPath,
    /// The scan path is relative.
    #[error("scan_path must be absolute: {0}")]
    ScanPathNotAbsolute(PathBuf),
    /// The scan path does not point at a directory.
    #[error("scan_path is not a directory: {0}")]
    ScanPathNotDirectory(PathBuf),
    /// A setting had a value that could not be coerced.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Offending settings key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A key outside [`KNOWN_KEYS`] was written.
    #[error("Unknown setting: {0}")]
    UnknownKey(String),
    /// Failed to read a settings file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse a TOML settings file.
    #[error("Invalid settings file at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Settings table could not be read.
    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),
}

/// Reject keys the catalog does not understand.
pub fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(ConfigError::UnknownKey(key.to_string()))
    }
}
