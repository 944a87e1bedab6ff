//! Enricher output: geographic/temporal/semantic context attached to a Signal.

use serde::{Deserialize, Serialize};

use crate::hash::truncated_fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalBucket {
    Immediate,
    NearTerm,
    LongTerm,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub geographic_tags: Vec<String>,
    pub temporal_bucket: TemporalBucket,
    pub semantic_tags: Vec<String>,
    pub is_commodity: bool,
}

impl Context {
    /// Stable fingerprint used as a dedup tie-breaker alongside
    /// `input_event_hash` when two events describe the same underlying
    /// market moment.
    pub fn context_hash(&self) -> String {
        truncated_fingerprint(self, 16).expect("Context always serializes")
    }
}
