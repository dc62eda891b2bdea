use serde::Serialize;

/// Counters accumulated while a pass runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// Eligible files yielded by the walk.
    pub scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Unchanged files that only had liveness refreshed.
    pub touched: usize,
    /// Successful content hashes.
    pub hashed: usize,
    /// Files that could not be read; no record was written for them.
    pub skipped: usize,
    pub deleted_marked: usize,
    /// New blob rows written.
    pub blobs_stored: usize,
}

/// JSON summary printed after each run and kept in job metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogReport {
    pub host: String,
    pub scan_path: String,
    pub extensions_filter: Vec<String>,
    pub store_blobs: bool,
    pub max_blob_kb: u32,
    /// RFC 3339, UTC.
    pub started_at: String,
    /// RFC 3339, UTC.
    pub finished_at: String,
    /// Wall-clock duration rounded to milliseconds.
    pub duration_sec: f64,
    pub scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub hashed: usize,
    pub skipped: usize,
    pub deleted_marked: usize,
    /// Unix seconds stamped into `last_seen` and `deleted_at` by this run.
    #[serde(skip)]
    pub run_timestamp: i64,
    /// Epoch stamped into every record this run observed.
    #[serde(skip)]
    pub epoch: i64,
    #[serde(skip)]
    pub touched: usize,
    #[serde(skip)]
    pub blobs_stored: usize,
}

/// Round a duration in seconds to millisecond precision.
pub(super) fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
