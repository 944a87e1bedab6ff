//! Reconciliation job (spec.md §4.10): replays sealed partitions against
//! the consumer's idempotent ingest endpoint, tracking a durable offset so a
//! restart resumes rather than reprocessing from the beginning.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consumer::{ConsumerClient, PublishOutcome};
use crate::error::EngineResult;
use crate::ledger::{frame_size, iter_partitions, iter_records, Tier};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileOffset {
    pub partition_id: String,
    pub byte_offset: u64,
}

impl ReconcileOffset {
    fn start() -> Self {
        Self {
            partition_id: String::new(),
            byte_offset: 0,
        }
    }
}

pub struct ReconcileReport {
    pub replayed: u32,
    pub duplicates: u32,
    pub rejected: u32,
}

pub struct ReconcileJob {
    base_path: PathBuf,
    offset_path: PathBuf,
    consumer: Arc<dyn ConsumerClient>,
    persist_every: u32,
}

impl ReconcileJob {
    pub fn new(base_path: PathBuf, offset_path: PathBuf, consumer: Arc<dyn ConsumerClient>) -> Self {
        Self {
            base_path,
            offset_path,
            consumer,
            persist_every: 100,
        }
    }

    fn load_offset(&self) -> ReconcileOffset {
        std::fs::read(&self.offset_path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_else(ReconcileOffset::start)
    }

    /// Persists the offset via write-tmp-then-rename so a crash mid-write
    /// never leaves a half-written offset file behind.
    fn save_offset(&self, offset: &ReconcileOffset) -> EngineResult<()> {
        let tmp_path = self.offset_path.with_extension("tmp");
        let bytes = serde_json::to_vec(offset)?;
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, &self.offset_path)?;
        Ok(())
    }

    /// Scans sealed (warm + cold) partitions in creation order starting
    /// from the last saved offset's partition, replaying every record at
    /// or after its byte offset. Advances and persists the offset after
    /// each partition's records are processed; stops early on a rejection
    /// that is not a duplicate, so a persistent downstream problem doesn't
    /// silently skip records.
    pub async fn run(&self) -> EngineResult<ReconcileReport> {
        let mut offset = self.load_offset();
        let mut report = ReconcileReport {
            replayed: 0,
            duplicates: 0,
            rejected: 0,
        };

        let mut partitions = iter_partitions(&self.base_path, Tier::Warm)?;
        partitions.extend(iter_partitions(&self.base_path, Tier::Cold)?);
        partitions.sort_by(|a, b| a.path.cmp(&b.path));

        let mut reached_current = offset.partition_id.is_empty();

        for info in &partitions {
            let id = partition_id(&info.path);
            if !reached_current {
                if id == offset.partition_id {
                    reached_current = true;
                } else {
                    continue;
                }
            }

            let from_offset = if id == offset.partition_id { offset.byte_offset } else { 0 };
            let records = iter_records(info, from_offset)?;
            let mut since_persist = 0u32;

            for (record_offset, payload) in records {
                let next_offset = record_offset + frame_size(payload.len());
                let signal: crate::domain::Signal = serde_json::from_slice(&payload)?;
                match self
                    .consumer
                    .publish(&signal, &signal.signal_id, true)
                    .await
                {
                    Ok(PublishOutcome::Accepted) => report.replayed += 1,
                    Ok(PublishOutcome::Duplicate) => report.duplicates += 1,
                    Ok(PublishOutcome::Rejected) => {
                        // Unrecoverable (malformed payload): log and advance
                        // past it rather than blocking the whole pipeline.
                        report.rejected += 1;
                        warn!(signal_id = %signal.signal_id, "reconcile publish rejected by consumer, advancing past it");
                    }
                    Err(e) => {
                        // Transient (5xx/timeout/network): stop here without
                        // advancing; the next run retries from this offset.
                        warn!(signal_id = %signal.signal_id, error = %e, "reconcile publish failed, stopping for retry");
                        self.save_offset(&offset)?;
                        return Ok(report);
                    }
                }

                offset = ReconcileOffset {
                    partition_id: id.clone(),
                    byte_offset: next_offset,
                };

                since_persist += 1;
                if since_persist >= self.persist_every {
                    self.save_offset(&offset)?;
                    since_persist = 0;
                }
            }

            self.save_offset(&offset)?;
        }

        info!(replayed = report.replayed, duplicates = report.duplicates, "reconcile pass complete");
        Ok(report)
    }
}

/// The partition's identity is its filename with the tier suffix stripped
/// (`.wal` or `.wal.gz`), so a persisted offset still matches after the
/// lifecycle manager compresses a warm partition to cold.
fn partition_id(path: &Path) -> String {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
    name.strip_suffix(".wal.gz")
        .or_else(|| name.strip_suffix(".wal"))
        .unwrap_or(name)
        .to_string()
}
