//! RawEvent: input to the pipeline, immutable after construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::hash::truncated_fingerprint;

/// Nested market data carried by a RawEvent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub source: String,
    pub market_id: String,
    pub total_volume_usd: f64,
    pub current_liquidity_usd: f64,
}

/// Input to the signal pipeline. Immutable once built: all fields are set at
/// construction, there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub probability: f64,
    pub market: MarketInfo,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RawEvent {
    pub fn new(
        event_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        probability: f64,
        market: MarketInfo,
        created_at: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let event = Self {
            event_id: event_id.into(),
            title: title.into(),
            description: description.into(),
            probability,
            market,
            created_at,
            metadata: BTreeMap::new(),
        };
        event.validate_shape()?;
        Ok(event)
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Structural validation independent of the rule engine: malformed input
    /// never reaches validation rules at all.
    pub fn validate_shape(&self) -> EngineResult<()> {
        if self.event_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("event_id must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(EngineError::InvalidInput(format!(
                "probability {} out of range [0,1]",
                self.probability
            )));
        }
        if self.market.total_volume_usd < 0.0 {
            return Err(EngineError::InvalidInput(
                "market.total_volume_usd must be >= 0".into(),
            ));
        }
        if self.market.current_liquidity_usd < 0.0 {
            return Err(EngineError::InvalidInput(
                "market.current_liquidity_usd must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// 16-hex-char truncation of SHA-256 over the canonical JSON of all
    /// fields. Stable across processes for byte-identical events (spec.md
    /// invariant: "For the same RawEvent bytes, input_event_hash ... are
    /// byte-identical across processes").
    pub fn input_event_hash(&self) -> String {
        truncated_fingerprint(self, 16).expect("RawEvent always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawEvent {
        RawEvent::new(
            "pm-1",
            "Red Sea shipping halt",
            "desc",
            0.62,
            MarketInfo {
                source: "polymarket".into(),
                market_id: "m1".into(),
                total_volume_usd: 500_000.0,
                current_liquidity_usd: 75_000.0,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn hash_has_length_16_and_is_stable() {
        let e = sample();
        let h1 = e.input_event_hash();
        let h2 = e.input_event_hash();
        assert_eq!(h1.len(), 16);
        assert_eq!(h1, h2);
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let err = RawEvent::new(
            "pm-2",
            "t",
            "d",
            1.5,
            MarketInfo {
                source: "polymarket".into(),
                market_id: "m2".into(),
                total_volume_usd: 1.0,
                current_liquidity_usd: 1.0,
            },
            Utc::now(),
        );
        assert!(matches!(err, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn different_metadata_changes_hash() {
        let mut e1 = sample();
        let mut e2 = sample();
        e1.metadata.insert("k".into(), "1".into());
        e2.metadata.insert("k".into(), "2".into());
        assert_ne!(e1.input_event_hash(), e2.input_event_hash());
    }
}
