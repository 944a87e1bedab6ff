//! Validation rule engine.
//!
//! Rules are modeled as a narrow capability — `{name, evaluate}` — rather
//! than a dynamic plug-in registry (spec.md §9: "dynamic plug-in rules →
//! tagged capability set"). Registration is explicit, at `Deps`
//! construction, in a fixed order; the engine evaluates sequentially and
//! never discovers rules at runtime.

mod anomaly;
mod commodity;
mod geographic;
mod liquidity;
mod news_quality;
mod semantic;

pub use anomaly::AnomalyDetectionRule;
pub use commodity::CommodityContextRule;
pub use geographic::GeographicRelevanceRule;
pub use liquidity::LiquidityRule;
pub use news_quality::NewsQualityGateRule;
pub use semantic::SemanticRelevanceRule;

use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// A pure function of (event, static config): no I/O, no wall clock.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, event: &RawEvent, context: &Context) -> ValidationResult;
}

#[derive(Debug, Clone, Copy)]
pub enum Policy {
    /// First FAILED terminates evaluation with an overall FAIL.
    Strict,
    /// Run all rules; overall PASS if no FAILED and mean score >= threshold.
    Permissive { min_overall_score: f64 },
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Permissive {
            min_overall_score: 0.5,
        }
    }
}

pub struct RuleOutcome {
    pub results: Vec<ValidationResult>,
    pub passed: bool,
}

pub struct RuleEngine {
    rules: Vec<Box<dyn ValidationRule>>,
    policy: Policy,
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn ValidationRule>>, policy: Policy) -> Self {
        Self { rules, policy }
    }

    /// Default built-in rule set in spec order: liquidity, geographic,
    /// semantic, anomaly, news quality, commodity.
    pub fn with_defaults(policy: Policy) -> Self {
        Self::new(
            vec![
                Box::new(LiquidityRule::default()),
                Box::new(GeographicRelevanceRule::default()),
                Box::new(SemanticRelevanceRule::default()),
                Box::new(AnomalyDetectionRule::default()),
                Box::new(NewsQualityGateRule),
                Box::new(CommodityContextRule::default()),
            ],
            policy,
        )
    }

    pub fn evaluate(&self, event: &RawEvent, context: &Context) -> RuleOutcome {
        let mut results = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let result = rule.evaluate(event, context);
            let failed = result.status == ValidationStatus::Failed;
            results.push(result);

            if failed {
                if let Policy::Strict = self.policy {
                    return RuleOutcome {
                        results,
                        passed: false,
                    };
                }
            }
        }

        let passed = match self.policy {
            Policy::Strict => !results.iter().any(|r| r.status == ValidationStatus::Failed),
            Policy::Permissive { min_overall_score } => {
                let any_failed = results.iter().any(|r| r.status == ValidationStatus::Failed);
                let mean = if results.is_empty() {
                    0.0
                } else {
                    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
                };
                !any_failed && mean >= min_overall_score
            }
        };

        RuleOutcome { results, passed }
    }
}
