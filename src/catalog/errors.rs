use std::path::PathBuf;

use thiserror::Error;

use crate::settings::ConfigError;
use crate::store::StoreError;

/// Errors that abort a catalog run.
///
/// Per-file failures are not represented here; they are counted as skipped.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The scan root could not be listed.
    #[error("Failed to read scan root {path}: {source}")]
    ScanRoot {
        /// Root directory that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Database operation failed during the run.
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
    /// A run timestamp could not be rendered.
    #[error("Failed to format timestamp: {0}")]
    FormatTime(#[from] time::error::Format),
}
