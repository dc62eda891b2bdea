//! Command-line surface of `hive-catalog`.
//!
//! Every command prints exactly one JSON document on stdout. Errors surface as
//! a single [`CliError`] that the binary prints on stderr before exiting 1.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::app_dirs::{self, AppDirError};
use crate::catalog::{CatalogError, CatalogReport, run_catalog};
use crate::settings::{
    CatalogConfig, ConfigError, ConfigOverrides, LayeredSettings, PartialConfig, SettingsStore,
    TomlSettings, ensure_known_key,
};
use crate::store::{CatalogCounts, CatalogDatabase, META_LAST_RUN, StoreError};

#[derive(Debug, Parser)]
#[command(
    name = "hive-catalog",
    version,
    about = "Catalog a directory tree into SQLite: hash new or changed files, soft-delete missing ones"
)]
pub struct Cli {
    /// Catalog database (defaults to catalog.db in the app directory)
    #[arg(long, global = true, value_name = "PATH", env = "AGENTHIVE_CATALOG_DB")]
    pub db: Option<PathBuf>,

    /// TOML settings file (defaults to catalog.toml in the app directory)
    #[arg(long, global = true, value_name = "PATH", env = "AGENTHIVE_CATALOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one catalog pass (the default when no command is given)
    Scan(ScanArgs),
    /// Print catalog totals and the last run report
    Status,
    /// Inspect or change settings stored in the database
    #[command(subcommand)]
    Settings(SettingsCommand),
}

/// Overrides accepted by a catalog pass.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Absolute directory to catalog
    #[arg(long, value_name = "DIR")]
    pub scan_path: Option<PathBuf>,

    /// Store a capped prefix of each new digest's content
    #[arg(long, overrides_with = "no_store_blobs")]
    pub store_blobs: bool,

    /// Do not store content blobs
    #[arg(long, overrides_with = "store_blobs")]
    pub no_store_blobs: bool,

    /// Per-blob cap in KiB
    #[arg(long, value_name = "KB", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_blob_kb: Option<u32>,
}

impl ScanArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        let store_blobs = if self.store_blobs {
            Some(true)
        } else if self.no_store_blobs {
            Some(false)
        } else {
            None
        };
        ConfigOverrides {
            scan_path: self.scan_path.clone(),
            store_blobs,
            max_blob_kb: self.max_blob_kb,
        }
    }

    fn is_empty(&self) -> bool {
        self.scan_path.is_none()
            && !self.store_blobs
            && !self.no_store_blobs
            && self.max_blob_kb.is_none()
    }

    /// Flags given after `scan` take precedence over the same flags given before it.
    fn merged(self, inner: ScanArgs) -> ScanArgs {
        let (store_blobs, no_store_blobs) = if inner.store_blobs || inner.no_store_blobs {
            (inner.store_blobs, inner.no_store_blobs)
        } else {
            (self.store_blobs, self.no_store_blobs)
        };
        ScanArgs {
            scan_path: inner.scan_path.or(self.scan_path),
            store_blobs,
            no_store_blobs,
            max_blob_kb: inner.max_blob_kb.or(self.max_blob_kb),
        }
    }
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Scan(_) => "scan",
            Command::Status => "status",
            Command::Settings(_) => "settings",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print every stored setting
    List,
    /// Print one stored setting, or null
    Get { key: String },
    /// Store a setting; VALUE is parsed as JSON, otherwise kept as a string
    Set { key: String, value: String },
    /// Remove a stored setting
    Unset { key: String },
}

/// Errors that reach the process boundary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Scan flags were combined with a command that does not scan.
    #[error("Scan options cannot be used with the {command} command")]
    ScanArgsWithoutScan { command: &'static str },
    /// Failed to render command output.
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Totals printed by `status`.
#[derive(Debug, Serialize)]
struct StatusReport {
    total_files: u64,
    live_files: u64,
    deleted_files: u64,
    blob_count: u64,
    blob_bytes: u64,
    scan_epoch: i64,
    last_run: Option<Value>,
}

impl StatusReport {
    fn new(counts: CatalogCounts, scan_epoch: i64, last_run: Option<Value>) -> Self {
        Self {
            total_files: counts.total_files,
            live_files: counts.live_files,
            deleted_files: counts.deleted_files,
            blob_count: counts.blob_count,
            blob_bytes: counts.blob_bytes,
            scan_epoch,
            last_run,
        }
    }
}

/// Run the parsed command and return the JSON document to print.
///
/// The database is opened before settings are resolved because it is one of
/// the settings layers.
pub fn execute(cli: Cli) -> Result<String, CliError> {
    let command = match cli.command {
        None => Command::Scan(cli.scan),
        Some(Command::Scan(args)) => Command::Scan(cli.scan.merged(args)),
        Some(command) if !cli.scan.is_empty() => {
            return Err(CliError::ScanArgsWithoutScan {
                command: command.name(),
            });
        }
        Some(command) => command,
    };
    let db = CatalogDatabase::open(resolve(cli.db, app_dirs::default_database_path)?)?;
    let output = match command {
        Command::Scan(args) => scan(&db, cli.config, &args)?,
        Command::Status => status(&db)?,
        Command::Settings(command) => settings(&db, command)?,
    };
    Ok(serde_json::to_string(&output)?)
}

fn resolve(
    explicit: Option<PathBuf>,
    default: fn() -> Result<PathBuf, AppDirError>,
) -> Result<PathBuf, AppDirError> {
    match explicit {
        Some(path) => Ok(path),
        None => default(),
    }
}

fn scan(
    db: &CatalogDatabase,
    config_path: Option<PathBuf>,
    args: &ScanArgs,
) -> Result<Value, CliError> {
    let report = run_scan(db, &resolve(config_path, app_dirs::default_settings_path)?, args)?;
    Ok(serde_json::to_value(report)?)
}

fn run_scan(
    db: &CatalogDatabase,
    config_path: &Path,
    args: &ScanArgs,
) -> Result<CatalogReport, CliError> {
    let file = TomlSettings::load(config_path)?;
    let layered = LayeredSettings::new().with_layer(&file).with_layer(db);
    let config = CatalogConfig::load(&layered, &args.overrides())?;
    Ok(run_catalog(db, &config)?)
}

fn status(db: &CatalogDatabase) -> Result<Value, CliError> {
    let last_run = match db.metadata(META_LAST_RUN)? {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            key: META_LAST_RUN.to_string(),
            source,
        })?),
        None => None,
    };
    let report = StatusReport::new(db.counts()?, db.scan_epoch()?, last_run);
    Ok(serde_json::to_value(report)?)
}

fn settings(db: &CatalogDatabase, command: SettingsCommand) -> Result<Value, CliError> {
    match command {
        SettingsCommand::List => {
            let mut listed = Map::new();
            for (key, _) in db.list_settings()? {
                if let Some(value) = SettingsStore::get(db, &key)? {
                    listed.insert(key, value);
                }
            }
            Ok(Value::Object(listed))
        }
        SettingsCommand::Get { key } => {
            ensure_known_key(&key)?;
            Ok(SettingsStore::get(db, &key)?.unwrap_or(Value::Null))
        }
        SettingsCommand::Set { key, value } => {
            ensure_known_key(&key)?;
            let value = parse_setting_value(&value);
            PartialConfig::from_settings(&SingleSetting {
                key: &key,
                value: &value,
            })?;
            db.set_setting(&key, &serde_json::to_string(&value)?)?;
            Ok(serde_json::json!({ "key": key, "value": value }))
        }
        SettingsCommand::Unset { key } => {
            ensure_known_key(&key)?;
            let removed = db.unset_setting(&key)?;
            Ok(serde_json::json!({ "key": key, "removed": removed }))
        }
    }
}

/// JSON when it parses, the raw text otherwise.
fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// A single candidate value, checked with the same coercion a scan applies.
struct SingleSetting<'a> {
    key: &'a str,
    value: &'a Value,
}

impl SettingsStore for SingleSetting<'_> {
    fn get(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok((key == self.key).then(|| self.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    struct Env {
        dir: TempDir,
    }

    impl Env {
        fn new() -> Self {
            Self {
                dir: tempdir().unwrap(),
            }
        }

        fn run(&self, args: &[&str]) -> Result<Value, CliError> {
            let db = self.dir.path().join("catalog.db");
            let config = self.dir.path().join("catalog.toml");
            let mut argv = vec![
                "hive-catalog".to_string(),
                "--db".to_string(),
                db.to_string_lossy().into_owned(),
                "--config".to_string(),
                config.to_string_lossy().into_owned(),
            ];
            argv.extend(args.iter().map(|arg| arg.to_string()));
            let cli = Cli::try_parse_from(argv).unwrap();
            execute(cli).map(|text| serde_json::from_str(&text).unwrap())
        }

        fn scan_root(&self) -> PathBuf {
            let root = self.dir.path().join("tree");
            std::fs::create_dir_all(&root).unwrap();
            root
        }
    }

    #[test]
    fn store_blob_flags_map_to_overrides() {
        let parse = |args: &[&str]| {
            let mut argv = vec!["hive-catalog"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv).unwrap().scan.overrides()
        };
        assert_eq!(parse(&[]).store_blobs, None);
        assert_eq!(parse(&["--store-blobs"]).store_blobs, Some(true));
        assert_eq!(parse(&["--no-store-blobs"]).store_blobs, Some(false));
        assert_eq!(
            parse(&["--store-blobs", "--no-store-blobs"]).store_blobs,
            Some(false)
        );
        assert_eq!(parse(&["--max-blob-kb", "64"]).max_blob_kb, Some(64));
        assert!(Cli::try_parse_from(["hive-catalog", "--max-blob-kb", "0"]).is_err());
    }

    #[test]
    fn scan_flags_before_the_scan_command_are_merged() {
        let env = Env::new();
        let root = env.scan_root();
        std::fs::write(root.join("a.txt"), b"alpha").unwrap();
        let report = env
            .run(&[
                "--scan-path",
                root.to_str().unwrap(),
                "--store-blobs",
                "scan",
                "--max-blob-kb",
                "8",
            ])
            .unwrap();
        assert_eq!(report["scanned"], 1);
        assert_eq!(report["store_blobs"], true);
        assert_eq!(report["max_blob_kb"], 8);

        let report = env
            .run(&[
                "--store-blobs",
                "scan",
                "--no-store-blobs",
                "--scan-path",
                root.to_str().unwrap(),
            ])
            .unwrap();
        assert_eq!(report["store_blobs"], false);
    }

    #[test]
    fn scan_flags_are_rejected_with_other_commands() {
        let env = Env::new();
        assert!(matches!(
            env.run(&["--scan-path", "/x", "status"]),
            Err(CliError::ScanArgsWithoutScan { command: "status" })
        ));
        assert!(matches!(
            env.run(&["--no-store-blobs", "settings", "list"]),
            Err(CliError::ScanArgsWithoutScan { command: "settings" })
        ));
        assert!(!env.dir.path().join("catalog.db").exists());
    }

    #[test]
    fn default_command_scans() {
        let env = Env::new();
        let root = env.scan_root();
        std::fs::write(root.join("a.txt"), b"alpha").unwrap();
        let report = env
            .run(&["--scan-path", root.to_str().unwrap()])
            .unwrap();
        assert_eq!(report["scanned"], 1);
        assert_eq!(report["inserted"], 1);
        assert_eq!(report["store_blobs"], false);
    }

    #[test]
    fn scan_uses_stored_settings_and_toml_overrides_them() {
        let env = Env::new();
        let root = env.scan_root();
        std::fs::write(root.join("a.txt"), b"alpha").unwrap();
        std::fs::write(root.join("b.md"), b"bravo").unwrap();

        env.run(&["settings", "set", "scan_path", root.to_str().unwrap()])
            .unwrap();
        env.run(&["settings", "set", "file_types", "md"]).unwrap();
        let report = env.run(&["scan"]).unwrap();
        assert_eq!(report["extensions_filter"], json!(["md"]));
        assert_eq!(report["scanned"], 1);

        std::fs::write(
            env.dir.path().join("catalog.toml"),
            "[catalog]\nfile_types = [\"txt\", \"md\"]\n",
        )
        .unwrap();
        let report = env.run(&["scan"]).unwrap();
        assert_eq!(report["extensions_filter"], json!(["txt", "md"]));
        assert_eq!(report["scanned"], 2);
    }

    #[test]
    fn missing_scan_path_is_a_config_error() {
        let env = Env::new();
        let err = env.run(&["scan"]).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::MissingScanPath)));
    }

    #[test]
    fn settings_set_get_list_unset() {
        let env = Env::new();
        assert_eq!(
            env.run(&["settings", "set", "store_blobs", "yes"]).unwrap(),
            json!({ "key": "store_blobs", "value": "yes" })
        );
        env.run(&["settings", "set", "max_blob_kb", "64"]).unwrap();
        assert_eq!(env.run(&["settings", "get", "max_blob_kb"]).unwrap(), json!(64));
        assert_eq!(
            env.run(&["settings", "list"]).unwrap(),
            json!({ "max_blob_kb": 64, "store_blobs": "yes" })
        );
        assert_eq!(
            env.run(&["settings", "unset", "store_blobs"]).unwrap(),
            json!({ "key": "store_blobs", "removed": true })
        );
        assert_eq!(env.run(&["settings", "get", "store_blobs"]).unwrap(), Value::Null);
    }

    #[test]
    fn settings_reject_unknown_keys_and_bad_values() {
        let env = Env::new();
        assert!(matches!(
            env.run(&["settings", "set", "theme", "dark"]),
            Err(CliError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(matches!(
            env.run(&["settings", "set", "max_blob_kb", "lots"]),
            Err(CliError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert_eq!(env.run(&["settings", "list"]).unwrap(), json!({}));
    }

    #[test]
    fn status_reports_counts_and_last_run() {
        let env = Env::new();
        let empty = env.run(&["status"]).unwrap();
        assert_eq!(empty["total_files"], 0);
        assert_eq!(empty["scan_epoch"], 0);
        assert_eq!(empty["last_run"], Value::Null);

        let root = env.scan_root();
        std::fs::write(root.join("a.txt"), b"alpha").unwrap();
        std::fs::write(root.join("b.txt"), b"bravo").unwrap();
        let report = env
            .run(&["scan", "--scan-path", root.to_str().unwrap(), "--store-blobs"])
            .unwrap();
        std::fs::remove_file(root.join("b.txt")).unwrap();
        env.run(&["scan", "--scan-path", root.to_str().unwrap()])
            .unwrap();

        let status = env.run(&["status"]).unwrap();
        assert_eq!(status["total_files"], 2);
        assert_eq!(status["live_files"], 1);
        assert_eq!(status["deleted_files"], 1);
        assert_eq!(status["blob_count"], 2);
        assert_eq!(status["blob_bytes"], 10);
        assert_eq!(status["scan_epoch"], 2);
        assert_eq!(status["last_run"]["deleted_marked"], 1);
        assert_eq!(report["store_blobs"], true);
    }
}
