//! HTTP client for the downstream consumer's ingest endpoint
//! (spec.md §6: `POST /api/v1/signals/ingest`, `GET /health`).

use async_trait::async_trait;

use crate::domain::Signal;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Accepted,
    Duplicate,
    Rejected,
}

#[async_trait]
pub trait ConsumerClient: Send + Sync {
    async fn publish(&self, signal: &Signal, idempotency_key: &str, is_replay: bool) -> EngineResult<PublishOutcome>;
    async fn health_check(&self) -> EngineResult<bool>;
}

pub struct HttpConsumerClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpConsumerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ConsumerClient for HttpConsumerClient {
    async fn publish(&self, signal: &Signal, idempotency_key: &str, is_replay: bool) -> EngineResult<PublishOutcome> {
        let url = format!("{}/api/v1/signals/ingest", self.base_url);
        let mut request = self
            .http
            .post(&url)
            .header("X-Idempotency-Key", idempotency_key)
            .json(signal);
        if is_replay {
            request = request.header("X-Replay-Source", "reconcile");
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::PublishUnavailable(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            200 | 201 => Ok(PublishOutcome::Accepted),
            409 => Ok(PublishOutcome::Duplicate),
            // 4xx other than 409 is a permanent rejection (malformed signal):
            // not retried, but not a circuit-breaker failure either.
            400..=499 => Ok(PublishOutcome::Rejected),
            _ => Err(EngineError::PublishUnavailable(format!("consumer returned {status}"))),
        }
    }

    async fn health_check(&self) -> EngineResult<bool> {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// In-memory `ConsumerClient` double used by unit and integration tests.
pub mod test_double {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct RecordingConsumerClient {
        pub calls: Mutex<Vec<(String, String, bool)>>,
        pub fail_next: Mutex<u32>,
        pub duplicate_ids: Mutex<std::collections::HashSet<String>>,
        pub reject_ids: Mutex<std::collections::HashSet<String>>,
    }

    #[async_trait]
    impl ConsumerClient for RecordingConsumerClient {
        async fn publish(&self, signal: &Signal, idempotency_key: &str, is_replay: bool) -> EngineResult<PublishOutcome> {
            self.calls
                .lock()
                .push((signal.signal_id.clone(), idempotency_key.to_string(), is_replay));

            let mut remaining = self.fail_next.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EngineError::PublishUnavailable("simulated outage".into()));
            }
            drop(remaining);

            if self.duplicate_ids.lock().contains(&signal.signal_id) {
                return Ok(PublishOutcome::Duplicate);
            }
            if self.reject_ids.lock().contains(&signal.signal_id) {
                return Ok(PublishOutcome::Rejected);
            }
            Ok(PublishOutcome::Accepted)
        }

        async fn health_check(&self) -> EngineResult<bool> {
            Ok(*self.fail_next.lock() == 0)
        }
    }
}
