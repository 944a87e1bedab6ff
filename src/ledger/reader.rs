//! Ledger reader: lists partitions and replays frames from them.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use std::io::Read;

use super::frame::scan_frames;
use super::partition::{list_partitions, Tier};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct PartitionInfo {
    pub path: PathBuf,
    pub tier: Tier,
}

/// Ordered sequence of sealed/hot partitions for a tier, oldest first —
/// `(date, epoch_ms, nonce)` lexicographic on path, which is creation order.
pub fn iter_partitions(base: &Path, tier: Tier) -> EngineResult<Vec<PartitionInfo>> {
    let paths = list_partitions(base, tier)?;
    Ok(paths.into_iter().map(|path| PartitionInfo { path, tier }).collect())
}

fn read_partition_bytes(info: &PartitionInfo) -> EngineResult<Vec<u8>> {
    let raw = fs::read(&info.path)?;
    if info.tier == Tier::Cold {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(EngineError::Io)?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

/// Decoded (offset, signal-json-bytes) pairs from `from_offset` to the end of
/// the partition. Finite — not restartable from the same call; the caller
/// resumes with a later `from_offset`.
pub fn iter_records(info: &PartitionInfo, from_offset: u64) -> EngineResult<Vec<(u64, Vec<u8>)>> {
    let bytes = read_partition_bytes(info)?;
    Ok(scan_frames(&bytes, from_offset)
        .into_iter()
        .map(|f| (f.offset, f.payload))
        .collect())
}

/// Validates the partition and returns the last good byte offset — the
/// point recovery/writer resumption should continue from.
pub fn tail(info: &PartitionInfo) -> EngineResult<u64> {
    let bytes = read_partition_bytes(info)?;
    Ok(super::frame::last_good_offset(&bytes))
}
