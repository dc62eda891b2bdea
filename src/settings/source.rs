use std::path::Path;

use serde_json::Value;

use super::ConfigError;
use crate::store::CatalogDatabase;

/// Key-value provider of raw, loosely typed settings.
pub trait SettingsStore {
    /// Fetch the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>, ConfigError>;
}

/// Settings held in a TOML file.
///
/// Keys may sit at the top level or inside a `[catalog]` table; top-level keys win.
#[derive(Debug, Clone, Default)]
pub struct TomlSettings {
    table: toml::Table,
}

impl TomlSettings {
    /// Load settings from `path`. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let mut table: toml::Table = toml::from_str(text)?;
        if let Some(toml::Value::Table(section)) = table.remove("catalog") {
            for (key, value) in section {
                table.entry(key).or_insert(value);
            }
        }
        Ok(Self { table })
    }
}

impl SettingsStore for TomlSettings {
    fn get(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        let Some(value) = self.table.get(key) else {
            return Ok(None);
        };
        serde_json::to_value(value)
            .map(Some)
            .map_err(|err| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: err.to_string(),
            })
    }
}

/// Values in the database `settings` table are JSON; bare text is read as a string.
impl SettingsStore for CatalogDatabase {
    fn get(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        let Some(raw) = self.setting(key)? else {
            return Ok(None);
        };
        Ok(Some(
            serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        ))
    }
}

/// Stack of settings stores; the first layer holding a key wins.
#[derive(Default)]
pub struct LayeredSettings<'a> {
    layers: Vec<&'a dyn SettingsStore>,
}

impl<'a> LayeredSettings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lower-priority layer.
    pub fn with_layer(mut self, layer: &'a dyn SettingsStore) -> Self {
        self.layers.push(layer);
        self
    }
}

impl SettingsStore for LayeredSettings<'_> {
    fn get(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        for layer in &self.layers {
            if let Some(value) = layer.get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
