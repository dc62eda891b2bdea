use std::path::PathBuf;

use super::coerce;
use super::defaults::{DEFAULT_MAX_BLOB_KB, MAX_BLOB_KB_LIMIT, default_skip_dir_names};
use super::{
    CatalogConfig, ConfigError, KEY_EXTENSIONS, KEY_FILE_TYPES, KEY_MAX_BLOB_KB, KEY_SCAN_PATH,
    KEY_SKIP_DIR_NAMES, KEY_STORE_BLOBS, SettingsStore,
};

/// Settings after coercion but before validation; `scan_path` may still be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialConfig {
    pub scan_path: Option<PathBuf>,
    pub file_types: Vec<String>,
    pub skip_dir_names: Vec<String>,
    pub store_blobs: bool,
    pub max_blob_kb: u32,
}

impl Default for PartialConfig {
    fn default() -> Self {
        Self {
            scan_path: None,
            file_types: Vec::new(),
            skip_dir_names: default_skip_dir_names(),
            store_blobs: false,
            max_blob_kb: DEFAULT_MAX_BLOB_KB,
        }
    }
}

impl PartialConfig {
    /// Read and coerce every recognized key, falling back to defaults.
    pub fn from_settings(store: &dyn SettingsStore) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = store.get(KEY_SCAN_PATH)? {
            config.scan_path = coerce::optional_path(KEY_SCAN_PATH, &value)?;
        }
        if let Some(value) = store.get(KEY_FILE_TYPES)? {
            config.file_types = coerce::extension_list(KEY_FILE_TYPES, &value)?;
        } else if let Some(value) = store.get(KEY_EXTENSIONS)? {
            config.file_types = coerce::extension_list(KEY_EXTENSIONS, &value)?;
        }
        if let Some(value) = store.get(KEY_SKIP_DIR_NAMES)? {
            config.skip_dir_names = coerce::string_list(KEY_SKIP_DIR_NAMES, &value)?;
        }
        if let Some(value) = store.get(KEY_STORE_BLOBS)? {
            config.store_blobs = coerce::boolean(KEY_STORE_BLOBS, &value)?;
        }
        if let Some(value) = store.get(KEY_MAX_BLOB_KB)? {
            config.max_blob_kb = coerce::positive_int(KEY_MAX_BLOB_KB, &value, MAX_BLOB_KB_LIMIT)?;
        }
        Ok(config)
    }

    /// Require an absolute, existing scan directory.
    pub fn validate(self) -> Result<CatalogConfig, ConfigError> {
        let scan_path = self.scan_path.ok_or(ConfigError::MissingScanPath)?;
        if !scan_path.is_absolute() {
            return Err(ConfigError::ScanPathNotAbsolute(scan_path));
        }
        if !scan_path.is_dir() {
            return Err(ConfigError::ScanPathNotDirectory(scan_path));
        }
        if self.max_blob_kb == 0 || self.max_blob_kb > MAX_BLOB_KB_LIMIT {
            return Err(ConfigError::InvalidValue {
                key: KEY_MAX_BLOB_KB.to_string(),
                reason: format!("must be between 1 and {MAX_BLOB_KB_LIMIT}"),
            });
        }
        Ok(CatalogConfig {
            scan_path,
            file_types: self.file_types,
            skip_dir_names: self.skip_dir_names,
            store_blobs: self.store_blobs,
            max_blob_kb: self.max_blob_kb,
        })
    }
}

/// Command-line values that take precedence over stored settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub scan_path: Option<PathBuf>,
    pub store_blobs: Option<bool>,
    pub max_blob_kb: Option<u32>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut PartialConfig) {
        if let Some(scan_path) = &self.scan_path {
            config.scan_path = Some(scan_path.clone());
        }
        if let Some(store_blobs) = self.store_blobs {
            config.store_blobs = store_blobs;
        }
        if let Some(max_blob_kb) = self.max_blob_kb {
            config.max_blob_kb = max_blob_kb;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TomlSettings;
    use crate::settings::defaults::DEFAULT_SKIP_DIR_NAMES;
    use tempfile::tempdir;

    fn toml(text: &str) -> TomlSettings {
        TomlSettings::parse(text).unwrap()
    }

    #[test]
    fn empty_settings_use_defaults() {
        let partial = PartialConfig::from_settings(&toml("")).unwrap();
        assert_eq!(partial.scan_path, None);
        assert!(partial.file_types.is_empty());
        assert_eq!(partial.skip_dir_names, DEFAULT_SKIP_DIR_NAMES);
        assert!(!partial.store_blobs);
        assert_eq!(partial.max_blob_kb, DEFAULT_MAX_BLOB_KB);
    }

    #[test]
    fn file_types_win_over_extensions_alias() {
        let partial =
            PartialConfig::from_settings(&toml("file_types = \"txt\"\nextensions = [\"md\"]"))
                .unwrap();
        assert_eq!(partial.file_types, vec!["txt"]);
        let partial = PartialConfig::from_settings(&toml("extensions = [\"MD\"]")).unwrap();
        assert_eq!(partial.file_types, vec!["md"]);
    }

    #[test]
    fn configured_skip_list_replaces_defaults() {
        let partial = PartialConfig::from_settings(&toml("skip_dir_names = \"build, dist\""))
            .unwrap();
        assert_eq!(partial.skip_dir_names, vec!["build", "dist"]);
    }

    #[test]
    fn malformed_values_fail_at_load_time() {
        let err = PartialConfig::from_settings(&toml("store_blobs = \"sometimes\"")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "store_blobs"));
        let err = PartialConfig::from_settings(&toml("max_blob_kb = -3")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "max_blob_kb"));
    }

    #[test]
    fn validate_requires_absolute_directory() {
        let err = PartialConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingScanPath));

        let relative = PartialConfig {
            scan_path: Some(PathBuf::from("relative/dir")),
            ..PartialConfig::default()
        };
        assert!(matches!(
            relative.validate(),
            Err(ConfigError::ScanPathNotAbsolute(_))
        ));

        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        let not_dir = PartialConfig {
            scan_path: Some(file),
            ..PartialConfig::default()
        };
        assert!(matches!(
            not_dir.validate(),
            Err(ConfigError::ScanPathNotDirectory(_))
        ));

        let ok = PartialConfig {
            scan_path: Some(dir.path().to_path_buf()),
            ..PartialConfig::default()
        };
        assert_eq!(ok.validate().unwrap().scan_path, dir.path());
    }

    #[test]
    fn overrides_take_precedence() {
        let dir = tempdir().unwrap();
        let settings = toml("scan_path = \"/nowhere/at/all\"\nstore_blobs = true\nmax_blob_kb = 8");
        let overrides = ConfigOverrides {
            scan_path: Some(dir.path().to_path_buf()),
            store_blobs: Some(false),
            max_blob_kb: Some(2),
        };
        let config = CatalogConfig::load(&settings, &overrides).unwrap();
        assert_eq!(config.scan_path, dir.path());
        assert!(!config.store_blobs);
        assert_eq!(config.max_blob_kb, 2);
    }

    #[test]
    fn zero_blob_override_is_rejected() {
        let dir = tempdir().unwrap();
        let overrides = ConfigOverrides {
            scan_path: Some(dir.path().to_path_buf()),
            max_blob_kb: Some(0),
            ..ConfigOverrides::default()
        };
        let err = CatalogConfig::load(&toml(""), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
