use super::ValidationRule;
use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// Flags outliers: a probability pinned at 0.0/1.0 combined with thin
/// liquidity is a classic stale-or-manipulated-market signature.
pub struct AnomalyDetectionRule {
    pub extreme_probability_epsilon: f64,
    pub suspicious_liquidity_usd: f64,
}

impl Default for AnomalyDetectionRule {
    fn default() -> Self {
        Self {
            extreme_probability_epsilon: 0.01,
            suspicious_liquidity_usd: 5_000.0,
        }
    }
}

impl ValidationRule for AnomalyDetectionRule {
    fn name(&self) -> &str {
        "anomaly_detection"
    }

    fn evaluate(&self, event: &RawEvent, _context: &Context) -> ValidationResult {
        let is_extreme = event.probability <= self.extreme_probability_epsilon
            || event.probability >= 1.0 - self.extreme_probability_epsilon;
        let is_thin = event.market.current_liquidity_usd < self.suspicious_liquidity_usd;

        if is_extreme && is_thin {
            return ValidationResult::new(
                self.name(),
                ValidationStatus::Warning,
                0.3,
                "extreme probability with thin liquidity",
            )
            .with_evidence("probability", event.probability.to_string())
            .with_evidence(
                "current_liquidity_usd",
                event.market.current_liquidity_usd.to_string(),
            );
        }

        ValidationResult::new(self.name(), ValidationStatus::Passed, 1.0, "no anomaly detected")
    }
}
