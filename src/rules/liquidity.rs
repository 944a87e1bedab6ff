use super::ValidationRule;
use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// FAIL if `market.current_liquidity_usd` is below the configured floor.
pub struct LiquidityRule {
    pub min_liquidity_usd: f64,
}

impl Default for LiquidityRule {
    fn default() -> Self {
        Self {
            min_liquidity_usd: 1_000.0,
        }
    }
}

impl ValidationRule for LiquidityRule {
    fn name(&self) -> &str {
        "liquidity"
    }

    fn evaluate(&self, event: &RawEvent, _context: &Context) -> ValidationResult {
        let liquidity = event.market.current_liquidity_usd;
        if liquidity < self.min_liquidity_usd {
            return ValidationResult::new(
                self.name(),
                ValidationStatus::Failed,
                0.0,
                format!(
                    "liquidity {:.2} below floor {:.2}",
                    liquidity, self.min_liquidity_usd
                ),
            )
            .with_evidence("current_liquidity_usd", liquidity.to_string());
        }

        // Score saturates at 1.0 once liquidity reaches 10x the floor.
        let score = (liquidity / (self.min_liquidity_usd * 10.0)).min(1.0);
        ValidationResult::new(
            self.name(),
            ValidationStatus::Passed,
            score,
            format!("liquidity {:.2} meets floor", liquidity),
        )
        .with_evidence("current_liquidity_usd", liquidity.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketInfo, TemporalBucket};
    use chrono::Utc;

    fn ctx() -> Context {
        Context {
            geographic_tags: vec![],
            temporal_bucket: TemporalBucket::Unknown,
            semantic_tags: vec![],
            is_commodity: false,
        }
    }

    fn event_with_liquidity(liquidity: f64) -> RawEvent {
        RawEvent::new(
            "e1",
            "t",
            "d",
            0.5,
            MarketInfo {
                source: "polymarket".into(),
                market_id: "m1".into(),
                total_volume_usd: 1.0,
                current_liquidity_usd: liquidity,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn fails_below_floor() {
        let rule = LiquidityRule::default();
        let r = rule.evaluate(&event_with_liquidity(500.0), &ctx());
        assert_eq!(r.status, ValidationStatus::Failed);
        assert_eq!(r.score, 0.0);
    }

    #[test]
    fn passes_at_floor_and_above() {
        let rule = LiquidityRule::default();
        let r = rule.evaluate(&event_with_liquidity(75_000.0), &ctx());
        assert_eq!(r.status, ValidationStatus::Passed);
        assert_eq!(r.score, 1.0);
    }
}
