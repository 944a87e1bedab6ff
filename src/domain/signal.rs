//! Signal: the durable, content-addressed output of the pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::Context;
use super::validation::ValidationResult;
use crate::hash::truncated_fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Fully determined by the mean of `validation_scores`: >=0.7 HIGH,
    /// >=0.4 MEDIUM, else LOW.
    pub fn from_mean_score(mean: f64) -> Self {
        if mean >= 0.7 {
            ConfidenceLevel::High
        } else if mean >= 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

pub fn mean_score(scores: &[ValidationResult]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|r| r.score).sum::<f64>() / scores.len() as f64
}

/// The subset of Signal fields that feed `signal_id`'s fingerprint.
/// `signal_id` and `emitted_at` are excluded by construction: including them
/// would make the id depend on itself, and `emitted_at` is set after the id
/// is already fixed. `generated_at` is excluded too — it's a wall-clock
/// timestamp, and signal_id must be reproducible for the same RawEvent
/// regardless of which process or instant re-derives it.
#[derive(Serialize)]
struct SignalFingerprint<'a> {
    input_event_hash: &'a str,
    deterministic_trace_id: &'a str,
    probability: f64,
    confidence_level: ConfidenceLevel,
    validation_scores: &'a [ValidationResult],
    evidence: &'a BTreeMap<String, String>,
    context: &'a Context,
    source_event_id: &'a str,
    source_system: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub signal_id: String,
    pub input_event_hash: String,
    pub deterministic_trace_id: String,
    pub generated_at: DateTime<Utc>,
    pub emitted_at: Option<DateTime<Utc>>,
    pub probability: f64,
    pub confidence_level: ConfidenceLevel,
    pub validation_scores: Vec<ValidationResult>,
    pub evidence: BTreeMap<String, String>,
    pub context: Context,
    pub source_event_id: String,
    pub source_system: String,
}

/// `trace_id` is a pure function of `input_event_hash`: reprocessing the
/// same RawEvent always yields the same trace id, independent of when or how
/// many times it is reprocessed.
pub fn deterministic_trace_id(input_event_hash: &str) -> String {
    let full = crate::hash::sha256_hex(input_event_hash.as_bytes());
    format!("TRACE-{}", &full[..24])
}

fn merge_evidence(scores: &[ValidationResult]) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for r in scores {
        for (k, v) in &r.evidence {
            merged.insert(format!("{}.{}", r.rule_name, k), v.clone());
        }
    }
    merged
}

impl Signal {
    /// Build a new Signal, computing `signal_id`, `trace_id`, `evidence`
    /// and `confidence_level` from the supplied pieces. `emitted_at` starts
    /// unset: the emitter sets it exactly once, after the ledger append
    /// succeeds.
    pub fn build(
        input_event_hash: String,
        generated_at: DateTime<Utc>,
        probability: f64,
        validation_scores: Vec<ValidationResult>,
        context: Context,
        source_event_id: String,
        source_system: String,
    ) -> Self {
        let trace_id = deterministic_trace_id(&input_event_hash);
        let confidence_level = ConfidenceLevel::from_mean_score(mean_score(&validation_scores));
        let evidence = merge_evidence(&validation_scores);

        let fingerprint = SignalFingerprint {
            input_event_hash: &input_event_hash,
            deterministic_trace_id: &trace_id,
            probability,
            confidence_level,
            validation_scores: &validation_scores,
            evidence: &evidence,
            context: &context,
            source_event_id: &source_event_id,
            source_system: &source_system,
        };
        let short = truncated_fingerprint(&fingerprint, 10).expect("Signal always serializes");
        let signal_id = format!("OMEN-{}", short.to_uppercase());

        Self {
            signal_id,
            input_event_hash,
            deterministic_trace_id: trace_id,
            generated_at,
            emitted_at: None,
            probability,
            confidence_level,
            validation_scores,
            evidence,
            context,
            source_event_id,
            source_system,
        }
    }

    pub fn mark_emitted(&mut self, at: DateTime<Utc>) {
        self.emitted_at = Some(at);
    }
}
