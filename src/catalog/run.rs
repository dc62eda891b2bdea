use std::time::Instant;

use sysinfo::System;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;

use crate::settings::CatalogConfig;
use crate::store::{CatalogDatabase, META_LAST_RUN, StoreError};

use super::errors::CatalogError;
use super::reconcile::{PassContext, reconcile_file, sweep};
use super::stats::{CatalogReport, ScanStats, round_millis};
use super::walk::CatalogWalk;

/// Run one catalog pass over `config.scan_path`.
///
/// Every write of the pass, the new scan epoch, and the stored report commit
/// in a single transaction; on error nothing is persisted.
pub fn run_catalog(
    db: &CatalogDatabase,
    config: &CatalogConfig,
) -> Result<CatalogReport, CatalogError> {
    let started_at = OffsetDateTime::now_utc();
    let clock = Instant::now();
    let mut batch = db.write_batch()?;
    let pass = PassContext {
        epoch: batch.scan_epoch()? + 1,
        seen_at: started_at.unix_timestamp(),
        blob_cap: config.store_blobs.then(|| config.max_blob_bytes()),
    };
    let mut stats = ScanStats::default();

    for path in CatalogWalk::new(config)? {
        stats.scanned += 1;
        reconcile_file(&mut batch, &pass, &path, &mut stats)?;
    }
    sweep(&mut batch, &pass, &mut stats)?;

    let finished_at = OffsetDateTime::now_utc();
    let report = build_report(config, &pass, &stats, started_at, finished_at, clock)?;
    let encoded = serde_json::to_string(&report).map_err(|source| StoreError::Json {
        key: META_LAST_RUN.to_string(),
        source,
    })?;
    batch.set_scan_epoch(pass.epoch)?;
    batch.set_metadata(META_LAST_RUN, &encoded)?;
    batch.commit()?;

    info!(
        scan_path = %config.scan_path.display(),
        epoch = pass.epoch,
        scanned = stats.scanned,
        inserted = stats.inserted,
        updated = stats.updated,
        touched = stats.touched,
        skipped = stats.skipped,
        deleted_marked = stats.deleted_marked,
        blobs_stored = stats.blobs_stored,
        duration_sec = report.duration_sec,
        "Catalog pass committed"
    );
    Ok(report)
}

fn build_report(
    config: &CatalogConfig,
    pass: &PassContext,
    stats: &ScanStats,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    clock: Instant,
) -> Result<CatalogReport, CatalogError> {
    Ok(CatalogReport {
        host: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        scan_path: config.scan_path.to_string_lossy().into_owned(),
        extensions_filter: config.file_types.clone(),
        store_blobs: config.store_blobs,
        max_blob_kb: config.max_blob_kb,
        started_at: started_at.format(&Rfc3339)?,
        finished_at: finished_at.format(&Rfc3339)?,
        duration_sec: round_millis(clock.elapsed().as_secs_f64()),
        scanned: stats.scanned,
        inserted: stats.inserted,
        updated: stats.updated,
        hashed: stats.hashed,
        skipped: stats.skipped,
        deleted_marked: stats.deleted_marked,
        run_timestamp: pass.seen_at,
        epoch: pass.epoch,
        touched: stats.touched,
        blobs_stored: stats.blobs_stored,
    })
}
