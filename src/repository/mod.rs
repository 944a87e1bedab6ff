//! Signal repository: find-by-id, find-by-input-hash, find-recent, save.
//!
//! Two flavors share this contract (spec.md §4.4): an in-memory bounded FIFO
//! and a durable SQLite-backed store. `save` upserts keyed by `signal_id`,
//! which is deterministic, so retries are always safe.

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use chrono::{DateTime, Utc};

use crate::domain::Signal;
use crate::error::EngineResult;

pub trait Repository: Send + Sync {
    fn save(&self, signal: Signal) -> EngineResult<()>;
    fn find_by_id(&self, signal_id: &str) -> EngineResult<Option<Signal>>;
    fn find_by_hash(&self, input_event_hash: &str) -> EngineResult<Option<Signal>>;
    fn find_recent(&self, limit: usize, since: Option<DateTime<Utc>>) -> EngineResult<Vec<Signal>>;
}
