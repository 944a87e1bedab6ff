//! Enricher: derives geographic/temporal/semantic context from a RawEvent.
//!
//! Fully deterministic — a pure function of the event's own fields, no wall
//! clock, no I/O — so re-enriching the same event always yields the same
//! `Context` (and therefore the same `context_hash`).

use crate::domain::{Context, RawEvent, TemporalBucket};

const GEO_KEYWORDS: &[(&str, &str)] = &[
    ("red sea", "middle_east"),
    ("middle east", "middle_east"),
    ("gulf", "middle_east"),
    ("europe", "europe"),
    ("eu ", "europe"),
    ("asia", "asia"),
    ("china", "asia"),
    ("america", "north_america"),
    ("us ", "north_america"),
    ("global", "global"),
];

const SEMANTIC_KEYWORDS: &[(&str, &str)] = &[
    ("shipping", "shipping"),
    ("oil", "commodity"),
    ("gas", "commodity"),
    ("wheat", "commodity"),
    ("gold", "commodity"),
    ("war", "conflict"),
    ("election", "politics"),
    ("inflation", "macro"),
    ("rate", "macro"),
    ("tariff", "trade"),
];

const IMMEDIATE_KEYWORDS: &[&str] = &["today", "breaking", "now", "imminent"];

pub struct Enricher;

impl Enricher {
    pub fn new() -> Self {
        Self
    }

    pub fn enrich(&self, event: &RawEvent) -> Context {
        let haystack = format!("{} {}", event.title, event.description).to_lowercase();

        let mut geographic_tags: Vec<String> = GEO_KEYWORDS
            .iter()
            .filter(|(kw, _)| haystack.contains(kw))
            .map(|(_, tag)| tag.to_string())
            .collect();
        geographic_tags.sort();
        geographic_tags.dedup();
        if geographic_tags.is_empty() {
            geographic_tags.push("global".to_string());
        }

        let mut semantic_tags: Vec<String> = SEMANTIC_KEYWORDS
            .iter()
            .filter(|(kw, _)| haystack.contains(kw))
            .map(|(_, tag)| tag.to_string())
            .collect();
        semantic_tags.sort();
        semantic_tags.dedup();

        let is_commodity = semantic_tags.iter().any(|t| t == "commodity");

        let temporal_bucket = if IMMEDIATE_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
            TemporalBucket::Immediate
        } else if semantic_tags.is_empty() && geographic_tags == ["global".to_string()] {
            TemporalBucket::Unknown
        } else {
            TemporalBucket::NearTerm
        };

        Context {
            geographic_tags,
            temporal_bucket,
            semantic_tags,
            is_commodity,
        }
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketInfo;
    use chrono::Utc;

    fn event(title: &str, description: &str) -> RawEvent {
        RawEvent::new(
            "e1",
            title,
            description,
            0.5,
            MarketInfo {
                source: "polymarket".into(),
                market_id: "m1".into(),
                total_volume_usd: 1.0,
                current_liquidity_usd: 1.0,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn enrichment_is_deterministic() {
        let e = event("Red Sea shipping halt", "oil tankers rerouted");
        let enricher = Enricher::new();
        let c1 = enricher.enrich(&e);
        let c2 = enricher.enrich(&e);
        assert_eq!(c1.context_hash(), c2.context_hash());
    }

    #[test]
    fn tags_commodity_and_geography() {
        let e = event("Red Sea shipping halt", "oil tankers rerouted");
        let c = Enricher::new().enrich(&e);
        assert!(c.geographic_tags.contains(&"middle_east".to_string()));
        assert!(c.is_commodity);
    }

    #[test]
    fn falls_back_to_global_with_no_geo_keywords() {
        let e = event("Market moves", "something happened");
        let c = Enricher::new().enrich(&e);
        assert_eq!(c.geographic_tags, vec!["global".to_string()]);
    }
}
