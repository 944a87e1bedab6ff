//! Error taxonomy for the engine.
//!
//! Kinds, not exception hierarchies: every fallible boundary in this crate
//! returns one of these variants so callers can match on category rather
//! than parse a message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed RawEvent; rejected at pipeline entry, not retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream source failed; wrapped by source retry.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Ledger append errored. Fatal for this signal's emit; the caller may
    /// resubmit the same event since processing is idempotent.
    #[error("ledger write failed: {0}")]
    LedgerWriteFailed(String),

    /// Publish retries exhausted or circuit open. Non-fatal: reconciliation
    /// will catch the signal up later.
    #[error("hot path failed after {attempts} attempts: {last_error}")]
    HotPathFailed { attempts: u32, last_error: String },

    /// A single hot-path publish attempt failed transiently (5xx, timeout,
    /// network error). Retried by the publish policy; not terminal on its
    /// own.
    #[error("publish attempt failed: {0}")]
    PublishUnavailable(String),

    /// Circuit breaker is open; call was not attempted.
    #[error("circuit '{0}' is open")]
    CircuitOpen(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
