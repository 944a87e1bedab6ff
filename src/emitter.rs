//! Dual-path emitter (spec.md §4.9): the ledger append is mandatory and
//! synchronous; the hot-path HTTP publish is best-effort, retried, and
//! circuit-broken, but a failure there never rolls back the ledger write.

use std::sync::Arc;

use tracing::{error, warn};

use crate::consumer::{ConsumerClient, PublishOutcome};
use crate::domain::Signal;
use crate::error::{EngineError, EngineResult};
use crate::hash::canonical_json;
use crate::ledger::LedgerWriter;
use crate::resilience::{retry_with_backoff, CircuitBreaker, RetryPolicy};
use crate::time::TimeProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitStatus {
    Delivered,
    Duplicate,
    Rejected,
    HotPathFailed,
}

#[derive(Debug, Clone)]
pub struct EmitResult {
    pub status: EmitStatus,
    pub partition_id: String,
    pub ledger_offset: u64,
}

pub struct SignalEmitter {
    ledger: Arc<LedgerWriter>,
    consumer: Arc<dyn ConsumerClient>,
    breaker: Arc<CircuitBreaker>,
    time: Arc<dyn TimeProvider>,
}

impl SignalEmitter {
    pub fn new(
        ledger: Arc<LedgerWriter>,
        consumer: Arc<dyn ConsumerClient>,
        breaker: Arc<CircuitBreaker>,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            ledger,
            consumer,
            breaker,
            time,
        }
    }

    /// Appends `signal` to the ledger, then attempts best-effort delivery
    /// on the hot path. The ledger append is the only step that can make
    /// this call return `Err` — every hot-path outcome is folded into
    /// `EmitResult::status` instead, since a publish failure after a
    /// successful ledger write is not a caller-visible error (spec.md
    /// §4.9: "ledger success is the durability guarantee").
    pub async fn emit(&self, mut signal: Signal) -> EngineResult<EmitResult> {
        let payload = canonical_json(&signal).map_err(EngineError::Serde)?;
        let (partition_id, offset) = self.ledger.append(&payload)?;
        // `emitted_at` is set only once the append above has succeeded
        // (spec.md §3/§4.9); the ledger frame itself never carries it.
        signal.mark_emitted(self.time.now());

        if !self.breaker.allow_request() {
            warn!(signal_id = %signal.signal_id, "circuit open, skipping hot-path publish");
            return Ok(EmitResult {
                status: EmitStatus::HotPathFailed,
                partition_id,
                ledger_offset: offset,
            });
        }

        let policy = RetryPolicy::publish();
        let breaker = &self.breaker;
        let consumer = &self.consumer;
        let idempotency_key = signal.signal_id.clone();
        let outcome = retry_with_backoff(policy, |_attempt| {
            let signal = &signal;
            let idempotency_key = &idempotency_key;
            async move {
                match consumer.publish(signal, idempotency_key, false).await {
                    Ok(outcome) => {
                        breaker.record_success();
                        Ok(outcome)
                    }
                    Err(e) => {
                        breaker.record_failure();
                        Err(e)
                    }
                }
            }
        })
        .await;

        let status = match outcome {
            Ok(PublishOutcome::Accepted) => EmitStatus::Delivered,
            Ok(PublishOutcome::Duplicate) => EmitStatus::Duplicate,
            Ok(PublishOutcome::Rejected) => EmitStatus::Rejected,
            Err(e) => {
                error!(signal_id = %signal.signal_id, error = %e, "hot-path publish exhausted retries");
                EmitStatus::HotPathFailed
            }
        };

        Ok(EmitResult {
            status,
            partition_id,
            ledger_offset: offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::test_double::RecordingConsumerClient;
    use crate::domain::context::{Context, TemporalBucket};
    use crate::domain::validation::{ValidationResult, ValidationStatus};
    use crate::time::FixedTimeProvider;
    use chrono::Utc;

    fn test_signal() -> Signal {
        Signal::build(
            "abc".into(),
            Utc::now(),
            0.5,
            vec![ValidationResult::new("r1", ValidationStatus::Passed, 0.8, "ok")],
            Context {
                geographic_tags: vec!["global".into()],
                temporal_bucket: TemporalBucket::NearTerm,
                semantic_tags: vec![],
                is_commodity: false,
            },
            "e1".into(),
            "polymarket".into(),
        )
    }

    #[tokio::test]
    async fn happy_path_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let time = Arc::new(FixedTimeProvider::new(Utc::now()));
        let ledger = Arc::new(
            LedgerWriter::open(dir.path().to_path_buf(), time.clone(), 64 * 1024 * 1024, 3600).unwrap(),
        );
        let consumer = Arc::new(RecordingConsumerClient::default());
        let breaker = Arc::new(CircuitBreaker::new("publish", 3, 30, time.clone()));
        let emitter = SignalEmitter::new(ledger, consumer.clone(), breaker, time);

        let result = emitter.emit(test_signal()).await.unwrap();
        assert_eq!(result.status, EmitStatus::Delivered);
        assert_eq!(consumer.calls.lock().len(), 1);
    }

    /// `emitted_at` must be unset at append time (spec.md §3: set exactly
    /// once, after the ledger append succeeds), so the persisted frame never
    /// carries it.
    #[tokio::test]
    async fn ledger_frame_has_no_emitted_at_at_append_time() {
        let dir = tempfile::tempdir().unwrap();
        let time = Arc::new(FixedTimeProvider::new(Utc::now()));
        let ledger = Arc::new(
            LedgerWriter::open(dir.path().to_path_buf(), time.clone(), 64 * 1024 * 1024, 3600).unwrap(),
        );
        let consumer = Arc::new(RecordingConsumerClient::default());
        let breaker = Arc::new(CircuitBreaker::new("publish", 3, 30, time.clone()));
        let emitter = SignalEmitter::new(ledger.clone(), consumer, breaker, time);

        let signal = test_signal();
        assert!(signal.emitted_at.is_none());
        let result = emitter.emit(signal).await.unwrap();

        let wal_path = find_wal_file(&dir.path().join("hot"));
        let bytes = std::fs::read(wal_path).unwrap();
        let raw = String::from_utf8(bytes).unwrap();
        assert_eq!(result.ledger_offset, 0);
        assert!(
            !raw.contains("emitted_at"),
            "ledger frame must not carry emitted_at: {raw}"
        );
    }

    fn find_wal_file(dir: &std::path::Path) -> std::path::PathBuf {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                return find_wal_file(&path);
            } else if path.extension().is_some_and(|e| e == "wal") {
                return path;
            }
        }
        panic!("no .wal file found under {}", dir.display());
    }

    #[tokio::test]
    async fn hot_path_outage_still_durable() {
        let dir = tempfile::tempdir().unwrap();
        let time = Arc::new(FixedTimeProvider::new(Utc::now()));
        let ledger = Arc::new(
            LedgerWriter::open(dir.path().to_path_buf(), time.clone(), 64 * 1024 * 1024, 3600).unwrap(),
        );
        let consumer = Arc::new(RecordingConsumerClient::default());
        *consumer.fail_next.lock() = 10;
        let breaker = Arc::new(CircuitBreaker::new("publish", 10, 30, time.clone()));
        let emitter = SignalEmitter::new(ledger.clone(), consumer, breaker, time);

        let result = emitter.emit(test_signal()).await.unwrap();
        assert_eq!(result.status, EmitStatus::HotPathFailed);
        assert_eq!(result.ledger_offset, 0);
    }

    /// A permanent 4xx rejection is not retried and never trips the breaker.
    #[tokio::test]
    async fn malformed_signal_is_rejected_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let time = Arc::new(FixedTimeProvider::new(Utc::now()));
        let ledger = Arc::new(
            LedgerWriter::open(dir.path().to_path_buf(), time.clone(), 64 * 1024 * 1024, 3600).unwrap(),
        );
        let signal = test_signal();
        let consumer = Arc::new(RecordingConsumerClient::default());
        consumer.reject_ids.lock().insert(signal.signal_id.clone());
        let breaker = Arc::new(CircuitBreaker::new("publish", 3, 30, time.clone()));
        let emitter = SignalEmitter::new(ledger, consumer.clone(), breaker.clone(), time);

        let result = emitter.emit(signal).await.unwrap();
        assert_eq!(result.status, EmitStatus::Rejected);
        assert_eq!(consumer.calls.lock().len(), 1, "a 4xx rejection must not be retried");
        assert_eq!(
            breaker.state(),
            crate::resilience::CircuitState::Closed,
            "a permanent rejection is not a breaker failure"
        );
    }
}
