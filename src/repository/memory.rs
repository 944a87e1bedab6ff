use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::Repository;
use crate::domain::Signal;
use crate::error::EngineResult;

struct Inner {
    order: VecDeque<String>,
    by_id: HashMap<String, Signal>,
    hash_to_id: HashMap<String, String>,
    max_size: usize,
}

impl Inner {
    fn evict_if_needed(&mut self) {
        while self.by_id.len() > self.max_size {
            if let Some(oldest_id) = self.order.pop_front() {
                if let Some(signal) = self.by_id.remove(&oldest_id) {
                    self.hash_to_id.remove(&signal.input_event_hash);
                }
            } else {
                break;
            }
        }
    }
}

/// Ordered mapping with FIFO eviction on overflow. All four repository
/// operations hold the same lock; no I/O happens inside the critical
/// section, so the lock is held only for pointer chasing and cloning.
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                order: VecDeque::new(),
                by_id: HashMap::new(),
                hash_to_id: HashMap::new(),
                max_size,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Repository for InMemoryRepository {
    fn save(&self, signal: Signal) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        // Upsert: if this signal_id already exists, replace in place without
        // disturbing FIFO order or double-counting capacity.
        if inner.by_id.contains_key(&signal.signal_id) {
            inner
                .hash_to_id
                .insert(signal.input_event_hash.clone(), signal.signal_id.clone());
            inner.by_id.insert(signal.signal_id.clone(), signal);
            return Ok(());
        }

        inner.order.push_back(signal.signal_id.clone());
        inner
            .hash_to_id
            .insert(signal.input_event_hash.clone(), signal.signal_id.clone());
        inner.by_id.insert(signal.signal_id.clone(), signal);
        inner.evict_if_needed();
        Ok(())
    }

    fn find_by_id(&self, signal_id: &str) -> EngineResult<Option<Signal>> {
        Ok(self.inner.lock().by_id.get(signal_id).cloned())
    }

    fn find_by_hash(&self, input_event_hash: &str) -> EngineResult<Option<Signal>> {
        let inner = self.inner.lock();
        Ok(inner
            .hash_to_id
            .get(input_event_hash)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    fn find_recent(&self, limit: usize, since: Option<DateTime<Utc>>) -> EngineResult<Vec<Signal>> {
        let inner = self.inner.lock();
        let mut out = Vec::with_capacity(limit.min(inner.order.len()));
        for id in inner.order.iter().rev() {
            if out.len() >= limit {
                break;
            }
            if let Some(signal) = inner.by_id.get(id) {
                if since.map(|cutoff| signal.generated_at >= cutoff).unwrap_or(true) {
                    out.push(signal.clone());
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Context, TemporalBucket};

    fn sig(id_seed: &str) -> Signal {
        Signal::build(
            id_seed.to_string(),
            Utc::now(),
            0.5,
            vec![],
            Context {
                geographic_tags: vec![],
                temporal_bucket: TemporalBucket::Unknown,
                semantic_tags: vec![],
                is_commodity: false,
            },
            "evt".into(),
            "polymarket".into(),
        )
    }

    #[test]
    fn fifo_eviction_keeps_both_indices_consistent() {
        let repo = InMemoryRepository::new(2);
        repo.save(sig("h1")).unwrap();
        repo.save(sig("h2")).unwrap();
        repo.save(sig("h3")).unwrap();

        assert_eq!(repo.len(), 2);
        assert!(repo.find_by_hash("h1").unwrap().is_none());
        assert!(repo.find_by_hash("h2").unwrap().is_some());
        assert!(repo.find_by_hash("h3").unwrap().is_some());
    }

    #[test]
    fn save_is_idempotent_upsert_by_signal_id() {
        let repo = InMemoryRepository::new(10);
        let s = sig("h1");
        let id = s.signal_id.clone();
        repo.save(s.clone()).unwrap();
        repo.save(s).unwrap();
        assert_eq!(repo.len(), 1);
        assert!(repo.find_by_id(&id).unwrap().is_some());
    }
}
