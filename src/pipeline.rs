//! Signal pipeline: validate -> enrich -> assemble -> dedupe.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{RawEvent, Signal};
use crate::enrich::Enricher;
use crate::error::EngineResult;
use crate::quality_metrics::QualityMetrics;
use crate::repository::Repository;
use crate::rules::RuleEngine;
use crate::time::TimeProvider;

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub signals: Vec<Signal>,
    pub cached: bool,
    pub success: bool,
    pub rejection_reason: Option<String>,
}

impl ProcessResult {
    fn cached_hit(signal: Signal) -> Self {
        Self {
            signals: vec![signal],
            cached: true,
            success: true,
            rejection_reason: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            signals: vec![],
            cached: false,
            success: false,
            rejection_reason: Some(reason.into()),
        }
    }

    fn accepted(signal: Signal) -> Self {
        Self {
            signals: vec![signal],
            cached: false,
            success: true,
            rejection_reason: None,
        }
    }
}

pub struct SignalPipeline {
    time: Arc<dyn TimeProvider>,
    rules: RuleEngine,
    enricher: Enricher,
    repository: Arc<dyn Repository>,
    quality: Arc<QualityMetrics>,
}

impl SignalPipeline {
    pub fn new(
        time: Arc<dyn TimeProvider>,
        rules: RuleEngine,
        enricher: Enricher,
        repository: Arc<dyn Repository>,
        quality: Arc<QualityMetrics>,
    ) -> Self {
        Self {
            time,
            rules,
            enricher,
            repository,
            quality,
        }
    }

    pub fn quality_metrics(&self) -> Arc<QualityMetrics> {
        self.quality.clone()
    }

    /// Runs the full pipeline. Idempotency contract: calling this twice with
    /// byte-identical RawEvents returns the same `signal_id` and the second
    /// call reports `cached = true` without re-running validation or
    /// enrichment.
    pub fn process(&self, event: &RawEvent) -> EngineResult<ProcessResult> {
        let input_event_hash = event.input_event_hash();

        if let Some(existing) = self.repository.find_by_hash(&input_event_hash)? {
            debug!(signal_id = %existing.signal_id, "pipeline cache hit");
            return Ok(ProcessResult::cached_hit(existing));
        }

        // The rule engine needs geographic/semantic/commodity context to
        // score some rules, so enrichment runs ahead of validation here
        // (see DESIGN.md: validation/enrichment ordering).
        let context = self.enricher.enrich(event);

        let outcome = self.rules.evaluate(event, &context);
        self.quality.record_validation(outcome.passed, &outcome.results);

        if !outcome.passed {
            let reason = outcome
                .results
                .iter()
                .find(|r| r.status == crate::domain::ValidationStatus::Failed)
                .map(|r| r.rule_name.clone())
                .unwrap_or_else(|| "validation_below_threshold".to_string());
            warn!(event_id = %event.event_id, reason, "signal rejected by validation");
            return Ok(ProcessResult::rejected(reason));
        }

        let signal = Signal::build(
            input_event_hash,
            self.time.now(),
            event.probability,
            outcome.results,
            context,
            event.event_id.clone(),
            event.market.source.clone(),
        );
        self.quality.record_confidence(signal.confidence_level);

        self.repository.save(signal.clone())?;
        info!(signal_id = %signal.signal_id, "signal processed");

        Ok(ProcessResult::accepted(signal))
    }
}
