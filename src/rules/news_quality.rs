use super::ValidationRule;
use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// Reject if source metadata marks the underlying news as stale or a
/// duplicate. Adapters attach these flags (`"stale": "true"`,
/// `"duplicate_of": "<event_id>"`) before the event reaches the pipeline.
#[derive(Default)]
pub struct NewsQualityGateRule;

impl ValidationRule for NewsQualityGateRule {
    fn name(&self) -> &str {
        "news_quality_gate"
    }

    fn evaluate(&self, event: &RawEvent, _context: &Context) -> ValidationResult {
        let is_stale = event
            .metadata
            .get("stale")
            .map(|v| v == "true")
            .unwrap_or(false);
        let duplicate_of = event.metadata.get("duplicate_of");

        if is_stale || duplicate_of.is_some() {
            let reason = if is_stale { "stale" } else { "duplicate" };
            return ValidationResult::new(
                self.name(),
                ValidationStatus::Failed,
                0.0,
                format!("news quality gate rejected: {reason}"),
            );
        }

        ValidationResult::new(self.name(), ValidationStatus::Passed, 1.0, "news quality ok")
    }
}
