/// Directory basenames pruned when `skip_dir_names` is not configured.
pub const DEFAULT_SKIP_DIR_NAMES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "vendor",
    "cache",
    ".cache",
    "logs",
    "log",
    "tmp",
];

pub const DEFAULT_MAX_BLOB_KB: u32 = 256;

/// Largest accepted `max_blob_kb`; SQLite rejects blobs over 1 GB.
pub const MAX_BLOB_KB_LIMIT: u32 = 512 * 1024;

pub(super) fn default_skip_dir_names() -> Vec<String> {
    DEFAULT_SKIP_DIR_NAMES.iter().map(|name| name.to_string()).collect()
}
