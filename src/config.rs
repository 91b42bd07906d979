// Service configuration, read from the environment (and `.env` if present).
// Every setting has a default; malformed values fall back to it.

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::polling::AdvancePolicy;
use crate::blockchain::retry::{Backoff, RetryPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub poll_interval: Duration,
    pub use_database: bool,
    pub database_url: String,
    pub retry_policy: RetryPolicy,
    pub max_concurrent_blocks: usize,
    pub advance_policy: AdvancePolicy,
    pub resume_from_watermark: bool,
    pub subscription_cache_capacity: u64,
    pub subscribe_addresses: String,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            rpc_url: "https://ethereum-rpc.publicnode.com/".to_string(),
            rpc_timeout_secs: 30,
            poll_interval: Duration::from_secs(5),
            use_database: false,
            database_url: "sqlite:data.db".to_string(),
            retry_policy: RetryPolicy::default(),
            max_concurrent_blocks: num_cpus::get() * 4,
            advance_policy: AdvancePolicy::OnDispatch,
            resume_from_watermark: true,
            subscription_cache_capacity: 10_000,
            subscribe_addresses: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let retry_policy = RetryPolicy {
            max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry_policy.max_attempts),
            base_delay: env::var("RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_policy.base_delay),
            max_delay: env::var("RETRY_MAX_DELAY_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_policy.max_delay),
            backoff: env::var("RETRY_BACKOFF")
                .ok()
                .and_then(|v| Backoff::parse(&v))
                .unwrap_or(defaults.retry_policy.backoff),
        };

        let poll_interval = env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let advance_policy = env::var("ADVANCE_WATERMARK_ON")
            .ok()
            .and_then(|v| AdvancePolicy::parse(&v))
            .unwrap_or(defaults.advance_policy);

        Self {
            server_host: env_string("SERVER_HOST", &defaults.server_host),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            rpc_url: env_string("RPC_URL", &defaults.rpc_url),
            rpc_timeout_secs: env_or("RPC_TIMEOUT_SECS", defaults.rpc_timeout_secs),
            poll_interval,
            use_database: env_or("USE_DATABASE", defaults.use_database),
            database_url: env_string("DATABASE_URL", &defaults.database_url),
            retry_policy,
            max_concurrent_blocks: env_or("MAX_CONCURRENT_BLOCKS", defaults.max_concurrent_blocks),
            advance_policy,
            resume_from_watermark: env_or("RESUME_FROM_WATERMARK", defaults.resume_from_watermark),
            subscription_cache_capacity: env_or(
                "SUBSCRIPTION_CACHE_CAPACITY",
                defaults.subscription_cache_capacity,
            ),
            subscribe_addresses: env_string("SUBSCRIBE_ADDRESSES", ""),
        }
    }
}
