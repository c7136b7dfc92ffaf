use std::{env, fmt::Debug, time::Duration};

use log::*;
use loyalty_engine::{
    accrual::AccrualClientConfig,
    pipeline::{Backpressure, PipelineConfig},
};
use lp_common::helpers::{parse_boolean_flag, parse_positive, parse_seconds};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty_store.db";
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://127.0.0.1:8081";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REDRIVE_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_REDRIVE_AFTER: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// If true, the database schema is assumed to be up to date and migrations are not run on start-up.
    pub skip_migrations: bool,
    pub accrual: AccrualClientConfig,
    pub pipeline: PipelineConfig,
    pub redrive: RedriveConfig,
}

#[derive(Clone, Debug)]
pub struct RedriveConfig {
    /// How often to look for orders that have fallen out of the pipeline.
    pub interval: Duration,
    /// An unresolved order is only re-driven if it has not been touched for this long. This keeps orders that are
    /// merely waiting in the queue from being picked up twice.
    pub stale_after: Duration,
}

impl Default for RedriveConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_REDRIVE_INTERVAL, stale_after: DEFAULT_REDRIVE_AFTER }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            skip_migrations: false,
            accrual: AccrualClientConfig::new(DEFAULT_ACCRUAL_SYSTEM_ADDRESS),
            pipeline: PipelineConfig::default(),
            redrive: RedriveConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which maps variable names to values. Missing or invalid values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let database_url = lookup("LPE_DATABASE_URL").unwrap_or_else(|| {
            error!(
                "🪛️ LPE_DATABASE_URL is not set. Please set it to the URL for the loyalty database. Using \
                 {DEFAULT_DATABASE_URL} for now."
            );
            DEFAULT_DATABASE_URL.to_string()
        });
        let base_url = lookup("LPE_ACCRUAL_SYSTEM_ADDRESS").unwrap_or_else(|| {
            error!(
                "🪛️ LPE_ACCRUAL_SYSTEM_ADDRESS is not set. Please set it to the address of the accrual system. Using \
                 {DEFAULT_ACCRUAL_SYSTEM_ADDRESS} for now."
            );
            DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string()
        });
        let d = &defaults.accrual;
        let accrual = AccrualClientConfig::new(base_url)
            .with_max_attempts(configure(&lookup, "LPE_ACCRUAL_MAX_ATTEMPTS", d.max_attempts, parse_positive))
            .with_retry_interval(configure(&lookup, "LPE_ACCRUAL_RETRY_INTERVAL", d.retry_interval, parse_seconds))
            .with_max_retry_delay(configure(&lookup, "LPE_ACCRUAL_MAX_RETRY_DELAY", d.max_retry_delay, parse_seconds))
            .with_request_timeout(configure(&lookup, "LPE_ACCRUAL_REQUEST_TIMEOUT", d.request_timeout, parse_seconds));
        let d = &defaults.pipeline;
        let fail_fast = parse_boolean_flag(lookup("LPE_QUEUE_FAIL_FAST"), false);
        let backpressure = if fail_fast { Backpressure::FailFast } else { Backpressure::Block };
        let pipeline = PipelineConfig {
            workers: configure(&lookup, "LPE_WORKER_POOL_SIZE", d.workers, parse_positive),
            queue_capacity: configure(&lookup, "LPE_QUEUE_CAPACITY", d.queue_capacity, parse_positive),
            backpressure,
            shutdown_timeout: configure(&lookup, "LPE_SHUTDOWN_TIMEOUT", d.shutdown_timeout, parse_seconds),
        };
        let d = &defaults.redrive;
        let redrive = RedriveConfig {
            interval: configure(&lookup, "LPE_REDRIVE_INTERVAL", d.interval, parse_seconds),
            stale_after: configure(&lookup, "LPE_REDRIVE_AFTER", d.stale_after, parse_seconds),
        };
        let db_max_connections =
            configure(&lookup, "LPE_DB_MAX_CONNECTIONS", defaults.db_max_connections, parse_positive);
        let skip_migrations = parse_boolean_flag(lookup("LPE_SKIP_MIGRATIONS"), false);
        Self { database_url, db_max_connections, skip_migrations, accrual, pipeline, redrive }
    }
}

fn configure<F, T, P>(lookup: &F, name: &str, default: T, parse: P) -> T
where
    F: Fn(&str) -> Option<String>,
    T: Debug,
    P: Fn(Option<String>) -> Option<T>,
{
    match lookup(name) {
        None => {
            info!("🪛️ {name} is not set. Using the default value of {default:?}.");
            default
        },
        Some(s) => parse(Some(s.clone())).unwrap_or_else(|| {
            warn!("🪛️ Invalid configuration value for {name}: '{s}'. Using the default value of {default:?}.");
            default
        }),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> WorkerConfig {
        let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        WorkerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.accrual.base_url, DEFAULT_ACCRUAL_SYSTEM_ADDRESS);
        assert_eq!(config.accrual.max_attempts, 5);
        assert_eq!(config.accrual.retry_interval, Duration::from_secs(1));
        assert_eq!(config.accrual.max_retry_delay, Duration::from_secs(60));
        assert_eq!(config.pipeline.workers, 10);
        assert_eq!(config.pipeline.queue_capacity, 10);
        assert_eq!(config.pipeline.backpressure, Backpressure::Block);
        assert_eq!(config.pipeline.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.redrive.interval, Duration::from_secs(60));
        assert_eq!(config.redrive.stale_after, Duration::from_secs(120));
        assert_eq!(config.db_max_connections, 10);
        assert!(!config.skip_migrations);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("LPE_DATABASE_URL", "sqlite://tmp/x.db"),
            ("LPE_ACCRUAL_SYSTEM_ADDRESS", "http://accrual:8080"),
            ("LPE_WORKER_POOL_SIZE", "3"),
            ("LPE_QUEUE_CAPACITY", "50"),
            ("LPE_QUEUE_FAIL_FAST", "true"),
            ("LPE_ACCRUAL_MAX_ATTEMPTS", "2"),
            ("LPE_ACCRUAL_RETRY_INTERVAL", "4"),
            ("LPE_REDRIVE_AFTER", "600"),
        ]);
        assert_eq!(config.database_url, "sqlite://tmp/x.db");
        assert_eq!(config.accrual.order_url("1"), "http://accrual:8080/api/orders/1");
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.pipeline.queue_capacity, 50);
        assert_eq!(config.pipeline.backpressure, Backpressure::FailFast);
        assert_eq!(config.accrual.max_attempts, 2);
        assert_eq!(config.accrual.retry_interval, Duration::from_secs(4));
        assert_eq!(config.redrive.stale_after, Duration::from_secs(600));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[("LPE_WORKER_POOL_SIZE", "0"), ("LPE_QUEUE_CAPACITY", "lots")]);
        assert_eq!(config.pipeline.workers, 10);
        assert_eq!(config.pipeline.queue_capacity, 10);
    }
}
