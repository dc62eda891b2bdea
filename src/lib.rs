//! Deterministic file catalog for AgentHive.
//!
//! Walks a directory tree, hashes new or changed files, upserts one record per
//! path into SQLite, and soft-deletes records whose files disappeared.

/// Application directory resolution.
pub mod app_dirs;
/// Walk, change detection, hashing, and reconciliation of one pass.
pub mod catalog;
/// Command-line surface of the `hive-catalog` binary.
pub mod cli;
/// Tracing subscriber setup.
pub mod logging;
/// Typed configuration and the settings stores it is loaded from.
pub mod settings;
/// SQLite persistence for file records, blobs, settings, and metadata.
pub mod store;
