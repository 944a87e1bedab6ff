use super::ValidationRule;
use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// Enriches-and-checks context for commodity-tagged events. Only applies
/// when the enricher tagged the event as a commodity market; otherwise it
/// is a no-op that neither helps nor hurts confidence.
#[derive(Default)]
pub struct CommodityContextRule {
    pub min_commodity_liquidity_usd: f64,
}

impl ValidationRule for CommodityContextRule {
    fn name(&self) -> &str {
        "commodity_context"
    }

    fn evaluate(&self, event: &RawEvent, context: &Context) -> ValidationResult {
        if !context.is_commodity {
            return ValidationResult::new(
                self.name(),
                ValidationStatus::Skipped,
                1.0,
                "event is not commodity-tagged",
            );
        }

        let floor = if self.min_commodity_liquidity_usd > 0.0 {
            self.min_commodity_liquidity_usd
        } else {
            2_000.0
        };

        if event.market.current_liquidity_usd < floor {
            return ValidationResult::new(
                self.name(),
                ValidationStatus::Warning,
                0.4,
                "commodity market liquidity below commodity-specific floor",
            );
        }

        ValidationResult::new(
            self.name(),
            ValidationStatus::Passed,
            1.0,
            "commodity context checks passed",
        )
    }
}
