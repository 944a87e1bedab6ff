//! Lifecycle manager: seal -> compress -> archive -> delete, by age.
//!
//! Each task re-scans the filesystem from scratch and is safe to re-run
//! after a partial failure — there is no separate "what have I already
//! done" ledger to get out of sync with reality.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use super::partition::{list_partitions, Tier};
use super::writer::LedgerWriter;
use crate::error::EngineResult;
use crate::time::TimeProvider;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LifecycleReport {
    pub sealed: u32,
    pub compressed: u32,
    pub archived: u32,
    pub deleted: u32,
}

pub struct LifecycleManager {
    base_path: PathBuf,
    archive_path: PathBuf,
    writer: Arc<LedgerWriter>,
    time: Arc<dyn TimeProvider>,
    pub warm_retention_days: u64,
    pub cold_retention_days: u64,
    pub delete_after_days: u64,
}

impl LifecycleManager {
    pub fn new(
        base_path: PathBuf,
        archive_path: PathBuf,
        writer: Arc<LedgerWriter>,
        time: Arc<dyn TimeProvider>,
        warm_retention_days: u64,
        cold_retention_days: u64,
        delete_after_days: u64,
    ) -> Self {
        Self {
            base_path,
            archive_path,
            writer,
            time,
            warm_retention_days,
            cold_retention_days,
            delete_after_days,
        }
    }

    pub fn run_lifecycle_tasks(&self) -> EngineResult<LifecycleReport> {
        let mut report = LifecycleReport::default();

        if self.writer.seal_if_needed()?.is_some() {
            report.sealed += 1;
        }

        report.compressed = self.compress_warm()?;
        report.archived = self.archive_cold()?;
        report.deleted = self.delete_expired_archive()?;

        info!(?report, "lifecycle tasks completed");
        Ok(report)
    }

    fn compress_warm(&self) -> EngineResult<u32> {
        let now = self.time.now();
        let cutoff = now - chrono::Duration::days(self.warm_retention_days as i64);
        let mut count = 0;

        for path in list_partitions(&self.base_path, Tier::Warm)? {
            let Some(created_at) = partition_created_at(&path) else {
                continue;
            };
            if created_at > cutoff {
                continue;
            }

            let cold_path = super::partition::partition_path(
                &self.base_path,
                Tier::Cold,
                created_at,
                nonce_from_path(&path),
            );
            if let Some(parent) = cold_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let raw = fs::read(&path)?;
            let cold_file = File::create(&cold_path)?;
            let mut encoder = GzEncoder::new(cold_file, Compression::default());
            encoder.write_all(&raw)?;
            encoder.finish()?;
            fs::remove_file(&path)?;

            info!(from = %path.display(), to = %cold_path.display(), "compressed warm partition to cold tier");
            count += 1;
        }
        Ok(count)
    }

    fn archive_cold(&self) -> EngineResult<u32> {
        let now = self.time.now();
        let cutoff = now - chrono::Duration::days(self.cold_retention_days as i64);
        let mut count = 0;

        for path in list_partitions(&self.base_path, Tier::Cold)? {
            let Some(created_at) = partition_created_at(&path) else {
                continue;
            };
            if created_at > cutoff {
                continue;
            }

            let file_name = path.file_name().unwrap_or_default();
            let archive_target = self.archive_path.join(file_name);
            if let Some(parent) = archive_target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&path, &archive_target)?;
            fs::remove_file(&path)?;

            info!(from = %path.display(), to = %archive_target.display(), "archived cold partition");
            count += 1;
        }
        Ok(count)
    }

    fn delete_expired_archive(&self) -> EngineResult<u32> {
        if !self.archive_path.exists() {
            return Ok(0);
        }
        let now = self.time.now();
        let cutoff = now - chrono::Duration::days(self.delete_after_days as i64);
        let mut count = 0;

        for entry in fs::read_dir(&self.archive_path)? {
            let entry = entry?;
            let path = entry.path();
            let Some(created_at) = partition_created_at(&path) else {
                continue;
            };
            if created_at > cutoff {
                continue;
            }
            fs::remove_file(&path)?;
            info!(path = %path.display(), "deleted expired archive entry");
            count += 1;
        }
        Ok(count)
    }
}

/// Recovers the partition's creation instant from its filename
/// (`<epoch_ms>-<nonce>.wal[.gz]`) rather than filesystem mtime, so lifecycle
/// decisions are reproducible under an injected time provider in tests.
fn partition_created_at(path: &Path) -> Option<DateTime<Utc>> {
    let stem = path.file_name()?.to_str()?;
    let stem = stem.strip_suffix(".wal.gz").or_else(|| stem.strip_suffix(".wal"))?;
    let epoch_ms: i64 = stem.split('-').next()?.parse().ok()?;
    Utc.timestamp_millis_opt(epoch_ms).single()
}

fn nonce_from_path(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit('-').next())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedTimeProvider;
    use chrono::Duration;

    #[test]
    fn compress_moves_aged_warm_partitions_to_cold() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_path_buf();
        let time = Arc::new(FixedTimeProvider::new(Utc::now()));

        let writer = Arc::new(
            LedgerWriter::open(base.clone(), time.clone(), 64 * 1024 * 1024, 3600).unwrap(),
        );
        writer.append(b"{\"a\":1}").unwrap();
        // Force a seal so there's a warm partition to compress.
        {
            let old_time = time.now();
            time.advance(Duration::hours(2));
            let _ = old_time;
        }
        writer.seal_if_needed().unwrap();

        time.advance(Duration::days(10));

        let manager = LifecycleManager::new(
            base.clone(),
            dir.path().join("archive"),
            writer,
            time,
            7,
            90,
            365,
        );
        let report = manager.run_lifecycle_tasks().unwrap();
        assert_eq!(report.compressed, 1);
        assert_eq!(list_partitions(&base, Tier::Warm).unwrap().len(), 0);
        assert_eq!(list_partitions(&base, Tier::Cold).unwrap().len(), 1);
    }
}
