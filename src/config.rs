//! Engine configuration, loaded from environment variables.
//!
//! Follows the teacher's `Config::from_env` pattern: read, parse, fall back
//! to a sane default on anything missing or malformed, never panic.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub ledger_base_path: PathBuf,
    pub archive_path: PathBuf,
    pub hot_max_size_bytes: u64,
    pub hot_max_age_seconds: u64,
    pub warm_retention_days: u64,
    pub cold_retention_days: u64,
    pub delete_after_days: u64,
    pub consumer_url: String,
    pub reconcile_interval_seconds: u64,
    pub lifecycle_interval_seconds: u64,
    pub repo_max_size: usize,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            db_path: PathBuf::from(
                env::var("RISKCAST_DB_PATH").unwrap_or_else(|_| "./ledger/signals.db".to_string()),
            ),
            ledger_base_path: PathBuf::from(
                env::var("LEDGER_BASE_PATH").unwrap_or_else(|_| "./ledger".to_string()),
            ),
            archive_path: PathBuf::from(
                env::var("ARCHIVE_PATH").unwrap_or_else(|_| "./ledger/archive".to_string()),
            ),
            hot_max_size_bytes: env_parse("HOT_MAX_SIZE_BYTES", 64 * 1024 * 1024),
            hot_max_age_seconds: env_parse("HOT_MAX_AGE_SECONDS", 3600),
            warm_retention_days: env_parse("WARM_RETENTION_DAYS", 7),
            cold_retention_days: env_parse("COLD_RETENTION_DAYS", 90),
            delete_after_days: env_parse("DELETE_AFTER_DAYS", 365),
            consumer_url: env::var("CONSUMER_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            reconcile_interval_seconds: env_parse("RECONCILE_INTERVAL_SECONDS", 300),
            lifecycle_interval_seconds: env_parse("LIFECYCLE_INTERVAL_SECONDS", 86_400),
            repo_max_size: env_parse("REPO_MAX_SIZE", 10_000),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./ledger/signals.db"),
            ledger_base_path: PathBuf::from("./ledger"),
            archive_path: PathBuf::from("./ledger/archive"),
            hot_max_size_bytes: 64 * 1024 * 1024,
            hot_max_age_seconds: 3600,
            warm_retention_days: 7,
            cold_retention_days: 90,
            delete_after_days: 365,
            consumer_url: "http://localhost:9000".to_string(),
            reconcile_interval_seconds: 300,
            lifecycle_interval_seconds: 86_400,
            repo_max_size: 10_000,
        }
    }
}
