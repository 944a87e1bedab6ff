//! Aggregated signal quality metrics.
//!
//! Ported from `original_source/src/omen/domain/services/quality_metrics.py`,
//! dropped by the distilled spec but grounded in the teacher's own
//! `signals::quality::SignalQualityGate` rolling-statistics style. Tracked
//! by the pipeline alongside every `process()` call; exposed read-only via
//! `snapshot()`.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::domain::{ConfidenceLevel, ValidationResult, ValidationStatus};

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct QualityMetricsSnapshot {
    pub total_received: u64,
    pub total_validated: u64,
    pub total_rejected: u64,
    pub rejections_by_rule: BTreeMap<String, u64>,
    pub rejections_by_status: BTreeMap<String, u64>,
    pub confidence_distribution: BTreeMap<String, u64>,
    pub avg_validation_score: f64,
}

impl QualityMetricsSnapshot {
    pub fn rejection_rate(&self) -> f64 {
        if self.total_received == 0 {
            0.0
        } else {
            self.total_rejected as f64 / self.total_received as f64
        }
    }

    pub fn validation_rate(&self) -> f64 {
        if self.total_received == 0 {
            0.0
        } else {
            self.total_validated as f64 / self.total_received as f64
        }
    }
}

struct Inner {
    snapshot: QualityMetricsSnapshot,
    score_sum: f64,
}

pub struct QualityMetrics {
    inner: Mutex<Inner>,
}

impl QualityMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot: QualityMetricsSnapshot::default(),
                score_sum: 0.0,
            }),
        }
    }

    pub fn record_validation(&self, passed: bool, results: &[ValidationResult]) {
        let mut inner = self.inner.lock();
        inner.snapshot.total_received += 1;

        if passed {
            inner.snapshot.total_validated += 1;
        } else {
            inner.snapshot.total_rejected += 1;
            for r in results {
                if r.status != ValidationStatus::Passed {
                    *inner
                        .snapshot
                        .rejections_by_rule
                        .entry(r.rule_name.clone())
                        .or_insert(0) += 1;
                    let status_key = format!("{:?}", r.status);
                    *inner
                        .snapshot
                        .rejections_by_status
                        .entry(status_key)
                        .or_insert(0) += 1;
                }
            }
        }

        let batch_mean = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
        };
        inner.score_sum += batch_mean;
        let total = inner.snapshot.total_received;
        inner.snapshot.avg_validation_score = inner.score_sum / total as f64;
    }

    pub fn record_confidence(&self, level: ConfidenceLevel) {
        let mut inner = self.inner.lock();
        let key = format!("{:?}", level).to_uppercase();
        *inner.snapshot.confidence_distribution.entry(key).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> QualityMetricsSnapshot {
        self.inner.lock().snapshot.clone()
    }
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_rejection_and_validation_rate() {
        let m = QualityMetrics::new();
        m.record_validation(true, &[ValidationResult::new("r", ValidationStatus::Passed, 1.0, "ok")]);
        m.record_validation(
            false,
            &[ValidationResult::new("r", ValidationStatus::Failed, 0.0, "bad")],
        );
        let snap = m.snapshot();
        assert_eq!(snap.total_received, 2);
        assert_eq!(snap.rejection_rate(), 0.5);
        assert_eq!(snap.validation_rate(), 0.5);
        assert_eq!(*snap.rejections_by_rule.get("r").unwrap(), 1);
    }
}
