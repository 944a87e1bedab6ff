use super::ValidationRule;
use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// Score by overlap between the enricher's geographic tags and a configured
/// region set of interest. No match still PASSES at a neutral score; this
/// rule informs confidence, it does not gate.
pub struct GeographicRelevanceRule {
    pub regions_of_interest: Vec<String>,
}

impl Default for GeographicRelevanceRule {
    fn default() -> Self {
        Self {
            regions_of_interest: vec![
                "middle_east".into(),
                "europe".into(),
                "asia".into(),
                "north_america".into(),
                "global".into(),
            ],
        }
    }
}

impl ValidationRule for GeographicRelevanceRule {
    fn name(&self) -> &str {
        "geographic_relevance"
    }

    fn evaluate(&self, _event: &RawEvent, context: &Context) -> ValidationResult {
        let matches = context
            .geographic_tags
            .iter()
            .filter(|tag| self.regions_of_interest.iter().any(|r| r == *tag))
            .count();

        let score = if context.geographic_tags.is_empty() {
            0.5
        } else {
            (matches as f64 / context.geographic_tags.len() as f64).clamp(0.0, 1.0)
        };

        ValidationResult::new(
            self.name(),
            ValidationStatus::Passed,
            score,
            format!("{matches} of {} tags match regions of interest", context.geographic_tags.len()),
        )
        .with_evidence("matched_tags", matches.to_string())
    }
}
