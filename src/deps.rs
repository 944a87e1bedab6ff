//! Explicit dependency aggregate, wired once at startup and threaded
//! through the pipeline, emitter, and jobs — no global singletons.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::consumer::{ConsumerClient, HttpConsumerClient};
use crate::enrich::Enricher;
use crate::ledger::{LedgerWriter, LifecycleManager};
use crate::pipeline::SignalPipeline;
use crate::quality_metrics::QualityMetrics;
use crate::reconcile::ReconcileJob;
use crate::repository::{Repository, SqliteRepository};
use crate::resilience::CircuitBreaker;
use crate::rules::{Policy, RuleEngine};
use crate::time::{SystemTimeProvider, TimeProvider};

pub struct Deps {
    pub time: Arc<dyn TimeProvider>,
    pub ledger: Arc<LedgerWriter>,
    pub repository: Arc<dyn Repository>,
    pub quality_metrics: Arc<QualityMetrics>,
    pub consumer: Arc<dyn ConsumerClient>,
    pub publish_breaker: Arc<CircuitBreaker>,
    pub config: EngineConfig,
}

impl Deps {
    pub fn from_config(config: EngineConfig) -> anyhow::Result<Self> {
        let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

        let ledger = Arc::new(LedgerWriter::open(
            PathBuf::from(&config.ledger_base_path),
            time.clone(),
            config.hot_max_size_bytes,
            config.hot_max_age_seconds,
        )?);

        let repository: Arc<dyn Repository> =
            Arc::new(SqliteRepository::open(config.db_path.to_str().expect("valid utf-8 db path"))?);

        let quality_metrics = Arc::new(QualityMetrics::new());
        let consumer: Arc<dyn ConsumerClient> = Arc::new(HttpConsumerClient::new(config.consumer_url.clone()));
        let publish_breaker = Arc::new(CircuitBreaker::new("publish", 5, 60, time.clone()));

        Ok(Self {
            time,
            ledger,
            repository,
            quality_metrics,
            consumer,
            publish_breaker,
            config,
        })
    }

    pub fn build_pipeline(&self) -> SignalPipeline {
        SignalPipeline::new(
            self.time.clone(),
            RuleEngine::with_defaults(Policy::default()),
            Enricher::new(),
            self.repository.clone(),
            self.quality_metrics.clone(),
        )
    }

    pub fn build_lifecycle_manager(&self) -> LifecycleManager {
        LifecycleManager::new(
            self.config.ledger_base_path.clone(),
            self.config.archive_path.clone(),
            self.ledger.clone(),
            self.time.clone(),
            self.config.warm_retention_days,
            self.config.cold_retention_days,
            self.config.delete_after_days,
        )
    }

    pub fn build_reconcile_job(&self) -> ReconcileJob {
        ReconcileJob::new(
            self.config.ledger_base_path.clone(),
            self.config.ledger_base_path.join("reconcile_offset.json"),
            self.consumer.clone(),
        )
    }
}
