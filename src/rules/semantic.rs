use super::ValidationRule;
use crate::domain::{Context, RawEvent, ValidationResult, ValidationStatus};

/// Score by keyword match across title + description against a configured
/// keyword list. Pure text scan, no NLP model: deterministic by construction.
pub struct SemanticRelevanceRule {
    pub keywords: Vec<String>,
}

impl Default for SemanticRelevanceRule {
    fn default() -> Self {
        Self {
            keywords: vec![
                "shipping".into(),
                "oil".into(),
                "war".into(),
                "election".into(),
                "inflation".into(),
                "rate".into(),
                "supply".into(),
                "tariff".into(),
            ],
        }
    }
}

impl ValidationRule for SemanticRelevanceRule {
    fn name(&self) -> &str {
        "semantic_relevance"
    }

    fn evaluate(&self, event: &RawEvent, _context: &Context) -> ValidationResult {
        let haystack = format!("{} {}", event.title, event.description).to_lowercase();
        let matches = self
            .keywords
            .iter()
            .filter(|kw| haystack.contains(kw.as_str()))
            .count();

        let score = (matches as f64 / 3.0).min(1.0);
        ValidationResult::new(
            self.name(),
            ValidationStatus::Passed,
            score,
            format!("{matches} keyword matches"),
        )
        .with_evidence("matched_keywords", matches.to_string())
    }
}
