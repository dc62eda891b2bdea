//! One catalog pass: walk the scan root, reconcile each file against its
//! stored record, and soft-delete whatever the walk did not see.
//!
//! Liveness is tracked with a scan epoch. Each pass stamps the records it
//! observes with `previous + 1`; after the walk every live record carrying an
//! older epoch is marked deleted.

mod detect;
mod errors;
mod facts;
mod hash;
mod reconcile;
mod run;
mod stats;
mod walk;

pub use detect::{Change, classify};
pub use errors::CatalogError;
pub use facts::{FileFacts, extension_of, read_facts};
pub use hash::{HashedContent, hash_file};
pub use run::run_catalog;
pub use stats::{CatalogReport, ScanStats};
pub use walk::CatalogWalk;
