use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use governor::Quota;
use crate::handlers::heartbeat::HeartbeatFilter;

#[derive(Clone, Debug)]
pub struct Config {
    // Network
    pub master_bind_address: String,
    pub http_bind_address: String,
    pub http_port: u16,

    // Sweep and query
    pub sweep_interval_secs: u64,
    pub server_timeout_secs: u64,
    pub query_dial_timeout_ms: u64,
    pub query_read_timeout_ms: u64,
    pub max_concurrent_queries: usize,

    // Heartbeat admission
    pub heartbeat_filter: HeartbeatFilter,

    // Rate limiting for the HTTP endpoints
    pub server_list_period_secs: u64,
    pub server_list_burst_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master_bind_address: "0.0.0.0:27010".to_string(),
            http_bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
            sweep_interval_secs: 30,
            server_timeout_secs: 300, // 5 minutes
            query_dial_timeout_ms: 3000,
            query_read_timeout_ms: 2000,
            max_concurrent_queries: 64,
            heartbeat_filter: HeartbeatFilter::Any,
            server_list_period_secs: 1,
            server_list_burst_limit: 10,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            master_bind_address: env_or("MASTER_BIND_ADDRESS", defaults.master_bind_address),
            http_bind_address: env_or("BIND_ADDRESS", defaults.http_bind_address),
            http_port: env_or("PORT", defaults.http_port),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            server_timeout_secs: env_or("SERVER_TIMEOUT_SECS", defaults.server_timeout_secs),
            query_dial_timeout_ms: env_or("QUERY_DIAL_TIMEOUT_MS", defaults.query_dial_timeout_ms),
            query_read_timeout_ms: env_or("QUERY_READ_TIMEOUT_MS", defaults.query_read_timeout_ms),
            max_concurrent_queries: env_or("MAX_CONCURRENT_QUERIES", defaults.max_concurrent_queries)
                .max(1),
            heartbeat_filter: env_or("HEARTBEAT_FILTER", defaults.heartbeat_filter),
            server_list_period_secs: env_or(
                "SERVER_LIST_PERIOD_SECS",
                defaults.server_list_period_secs,
            ),
            server_list_burst_limit: env_or(
                "SERVER_LIST_BURST_LIMIT",
                defaults.server_list_burst_limit,
            ),
        }
    }

    pub fn http_bind(&self) -> String {
        format!("{}:{}", self.http_bind_address, self.http_port)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.server_timeout_secs)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.query_dial_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.query_read_timeout_ms)
    }

    pub fn server_list_quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.server_list_burst_limit).unwrap_or(NonZeroU32::MIN);
        Quota::with_period(Duration::from_secs(self.server_list_period_secs))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst)
    }
}
