use std::{io::ErrorKind, path::Path};

use tracing::{debug, warn};

use crate::store::{BlobStore, CatalogWriteBatch, FileWrite, StoreError};

use super::detect::{Change, classify};
use super::facts::{FileFacts, read_facts};
use super::hash::{HashedContent, hash_file};
use super::stats::ScanStats;

/// Values shared by every write of one pass.
#[derive(Debug, Clone, Copy)]
pub(super) struct PassContext {
    /// Epoch stamped into every observed record.
    pub epoch: i64,
    /// Run start in unix seconds, used for `last_seen` and `deleted_at`.
    pub seen_at: i64,
    /// Blob cap in bytes when blob storage is enabled.
    pub blob_cap: Option<usize>,
}

/// Bring the record for one walked file in line with the filesystem.
///
/// Unreadable files and paths that are not valid UTF-8 are counted as skipped
/// and leave no write behind, so the end-of-pass sweep treats them as unseen.
pub(super) fn reconcile_file(
    batch: &mut CatalogWriteBatch<'_>,
    pass: &PassContext,
    path: &Path,
    stats: &mut ScanStats,
) -> Result<(), StoreError> {
    let facts = match read_facts(path) {
        Ok(facts) => facts,
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            warn!(path = %path.display(), "Skipping file whose path is not valid UTF-8");
            stats.skipped += 1;
            return Ok(());
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Skipping file that could not be stat'ed");
            stats.skipped += 1;
            return Ok(());
        }
    };
    let existing = batch.file_by_path(&facts.path)?;
    let change = classify(existing.as_ref(), &facts);
    if change == Change::Touch {
        batch.touch_file(&facts.path, pass.seen_at, pass.epoch)?;
        stats.touched += 1;
        return Ok(());
    }

    let hashed = match hash_file(path, pass.blob_cap) {
        Ok(hashed) => hashed,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Skipping file that could not be hashed");
            stats.skipped += 1;
            return Ok(());
        }
    };
    stats.hashed += 1;

    let write = file_write(&facts, &hashed, pass);
    match change {
        Change::Insert => {
            batch.insert_file(&write)?;
            stats.inserted += 1;
        }
        Change::Update => {
            batch.update_file(&write)?;
            stats.updated += 1;
        }
        Change::Touch => {}
    }

    if let Some(head) = hashed.head.as_deref()
        && store_blob(batch, &hashed.digest, head, facts.size_bytes, pass.seen_at)?
    {
        stats.blobs_stored += 1;
    }
    Ok(())
}

/// Soft-delete every live record this pass did not observe.
pub(super) fn sweep(
    batch: &mut CatalogWriteBatch<'_>,
    pass: &PassContext,
    stats: &mut ScanStats,
) -> Result<(), StoreError> {
    stats.deleted_marked = batch.sweep_unseen(pass.epoch, pass.seen_at)?;
    Ok(())
}

/// Store the captured prefix unless a blob for the digest already exists.
fn store_blob(
    blobs: &mut impl BlobStore,
    digest: &str,
    head: &[u8],
    size_bytes: u64,
    created_at: i64,
) -> Result<bool, StoreError> {
    if blobs.contains_blob(digest)? {
        return Ok(false);
    }
    blobs.put_blob(digest, head, size_bytes, created_at)
}

fn file_write<'a>(
    facts: &'a FileFacts,
    hashed: &'a HashedContent,
    pass: &PassContext,
) -> FileWrite<'a> {
    FileWrite {
        path: &facts.path,
        extension: &facts.extension,
        size_bytes: facts.size_bytes,
        mtime: facts.mtime,
        content_hash: &hashed.digest,
        seen_at: pass.seen_at,
        epoch: pass.epoch,
    }
}
