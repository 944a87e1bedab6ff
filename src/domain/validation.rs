//! Per-rule validation outcome.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Passed,
    Failed,
    Warning,
    Skipped,
}

/// Outcome of one validation rule. Emitted even when PASSED so that mean
/// scores accumulate correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub rule_name: String,
    pub status: ValidationStatus,
    pub score: f64,
    pub message: String,
    #[serde(default)]
    pub evidence: BTreeMap<String, String>,
}

impl ValidationResult {
    pub fn new(
        rule_name: impl Into<String>,
        status: ValidationStatus,
        score: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            status,
            score: score.clamp(0.0, 1.0),
            message: message.into(),
            evidence: BTreeMap::new(),
        }
    }

    pub fn with_evidence(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.evidence.insert(key.into(), value.into());
        self
    }
}
