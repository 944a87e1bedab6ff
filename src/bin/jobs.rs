//! Background job runner: ledger lifecycle (seal/compress/archive/delete)
//! and hot-path reconciliation, each on their own interval, or once via
//! `--once` for cron-style invocation.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use omen_engine::config::EngineConfig;
use omen_engine::deps::Deps;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Job {
    Lifecycle,
    Reconcile,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(value_enum)]
    job: Job,

    /// Run a single pass and exit instead of looping on the configured interval.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env();
    let deps = Deps::from_config(config.clone())?;

    match args.job {
        Job::Lifecycle => {
            let manager = deps.build_lifecycle_manager();
            loop {
                match manager.run_lifecycle_tasks() {
                    Ok(report) => info!(?report, "lifecycle pass complete"),
                    Err(e) => error!(error = %e, "lifecycle pass failed"),
                }
                if args.once {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(config.lifecycle_interval_seconds)).await;
            }
        }
        Job::Reconcile => {
            let job = deps.build_reconcile_job();
            loop {
                match job.run().await {
                    Ok(report) => info!(
                        replayed = report.replayed,
                        duplicates = report.duplicates,
                        rejected = report.rejected,
                        "reconcile pass complete"
                    ),
                    Err(e) => error!(error = %e, "reconcile pass failed"),
                }
                if args.once {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(config.reconcile_interval_seconds)).await;
            }
        }
    }

    Ok(())
}
