//! Ledger writer: exactly one active hot partition per writer instance,
//! single-writer discipline enforced by a mutex around the file handle.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::info;

use super::frame::{encode_frame, encode_trailer};
use super::partition::{generate_nonce, partition_path, Tier};
use crate::error::{EngineError, EngineResult};
use crate::time::TimeProvider;

const FLUSH_EVERY_FRAMES: u32 = 32;
const FLUSH_EVERY: StdDuration = StdDuration::from_millis(500);

struct HotState {
    file: BufWriter<File>,
    path: PathBuf,
    created_at: DateTime<Utc>,
    size: u64,
    record_count: u32,
    crc: crc32fast::Hasher,
    frames_since_flush: u32,
    last_flush: Instant,
}

pub struct LedgerWriter {
    base_path: PathBuf,
    time: Arc<dyn TimeProvider>,
    hot_max_size_bytes: u64,
    hot_max_age: chrono::Duration,
    state: Mutex<HotState>,
}

impl LedgerWriter {
    pub fn open(
        base_path: PathBuf,
        time: Arc<dyn TimeProvider>,
        hot_max_size_bytes: u64,
        hot_max_age_seconds: u64,
    ) -> EngineResult<Self> {
        let state = Self::open_new_hot(&base_path, &time)?;
        Ok(Self {
            base_path,
            time,
            hot_max_size_bytes,
            hot_max_age: chrono::Duration::seconds(hot_max_age_seconds as i64),
            state: Mutex::new(state),
        })
    }

    fn open_new_hot(base_path: &Path, time: &Arc<dyn TimeProvider>) -> EngineResult<HotState> {
        let created_at = time.now();
        let nonce = generate_nonce();
        let path = partition_path(base_path, Tier::Hot, created_at, &nonce);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "opened new hot partition");
        Ok(HotState {
            file: BufWriter::new(file),
            path,
            created_at,
            size: 0,
            record_count: 0,
            crc: crc32fast::Hasher::new(),
            frames_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    /// An empty partition is never sealed on age alone — there is nothing to
    /// roll, and doing so would leave behind an empty warm file every time
    /// the lifecycle manager's seal check finds an idle writer.
    fn should_seal(&self, state: &HotState) -> bool {
        state.record_count > 0
            && (state.size >= self.hot_max_size_bytes || self.time.now() - state.created_at >= self.hot_max_age)
    }

    /// Appends `payload` (the signal JSON) as one WAL frame, sealing the
    /// current hot partition first if it's aged/sized out. Either the full
    /// frame is persisted or the write errors and nothing is recorded as
    /// written (spec.md §4.5: "Write error ... the frame is NOT considered
    /// written").
    pub fn append(&self, payload: &[u8]) -> EngineResult<(String, u64)> {
        let mut state = self.state.lock();

        if self.should_seal(&state) {
            self.seal_locked(&mut state)?;
            *state = Self::open_new_hot(&self.base_path, &self.time)?;
        }

        let offset = state.size;
        let frame = encode_frame(payload);

        state
            .file
            .write_all(&frame)
            .map_err(|e| EngineError::LedgerWriteFailed(e.to_string()))?;

        state.size += frame.len() as u64;
        state.record_count += 1;
        state.crc.update(payload);
        state.frames_since_flush += 1;

        if state.frames_since_flush >= FLUSH_EVERY_FRAMES || state.last_flush.elapsed() >= FLUSH_EVERY {
            self.flush_locked(&mut state)?;
        }

        let partition_id = partition_id_of(&state.path);
        Ok((partition_id, offset))
    }

    fn flush_locked(&self, state: &mut HotState) -> EngineResult<()> {
        state
            .file
            .flush()
            .map_err(|e| EngineError::LedgerWriteFailed(e.to_string()))?;
        state
            .file
            .get_ref()
            .sync_all()
            .map_err(|e| EngineError::LedgerWriteFailed(e.to_string()))?;
        state.frames_since_flush = 0;
        state.last_flush = Instant::now();
        Ok(())
    }

    fn seal_locked(&self, state: &mut HotState) -> EngineResult<PathBuf> {
        self.flush_locked(state)?;

        let trailer = encode_trailer(state.record_count, state.crc.clone().finalize());
        state
            .file
            .write_all(&trailer)
            .map_err(|e| EngineError::LedgerWriteFailed(e.to_string()))?;
        self.flush_locked(state)?;

        let warm_path = super::partition::partition_path(
            &self.base_path,
            Tier::Warm,
            state.created_at,
            nonce_of(&state.path),
        );
        if let Some(parent) = warm_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&state.path, &warm_path)?;
        info!(from = %state.path.display(), to = %warm_path.display(), "sealed hot partition");
        Ok(warm_path)
    }

    /// Seals the current hot partition if it has aged or sized out, even
    /// with no pending append. The lifecycle manager calls this on its own
    /// schedule so idle partitions still roll.
    pub fn seal_if_needed(&self) -> EngineResult<Option<PathBuf>> {
        let mut state = self.state.lock();
        if !self.should_seal(&state) {
            return Ok(None);
        }
        let sealed_path = self.seal_locked(&mut state)?;
        *state = Self::open_new_hot(&self.base_path, &self.time)?;
        Ok(Some(sealed_path))
    }

    pub fn current_partition_id(&self) -> String {
        partition_id_of(&self.state.lock().path)
    }

    /// Forces buffered frames to disk without sealing. Used by callers that
    /// need to inspect the hot partition file directly.
    pub fn flush(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)
    }
}

fn partition_id_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn nonce_of(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit('-').next())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SystemTimeProvider;

    #[test]
    fn append_returns_growing_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LedgerWriter::open(
            dir.path().to_path_buf(),
            Arc::new(SystemTimeProvider),
            64 * 1024 * 1024,
            3600,
        )
        .unwrap();

        let (p1, o1) = writer.append(b"{\"a\":1}").unwrap();
        let (p2, o2) = writer.append(b"{\"a\":2}").unwrap();
        assert_eq!(p1, p2);
        assert!(o2 > o1);
    }

    #[test]
    fn seal_renames_into_warm_tier() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LedgerWriter::open(
            dir.path().to_path_buf(),
            Arc::new(SystemTimeProvider),
            1, // seals on the very next append
            3600,
        )
        .unwrap();

        writer.append(b"{\"a\":1}").unwrap();
        writer.append(b"{\"a\":2}").unwrap();

        let warm = super::super::partition::list_partitions(dir.path(), Tier::Warm).unwrap();
        assert_eq!(warm.len(), 1);
    }
}
