//! Configuration for market data operations

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Browser-like agent; several upstreams reject the default reqwest agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const ENV_REQUEST_TIMEOUT: &str = "STOCK_REQUEST_TIMEOUT_SECS";
const ENV_CACHE_TTL: &str = "STOCK_CACHE_TTL_SECS";
const ENV_INTL_RATE_LIMIT: &str = "STOCK_INTL_RATE_LIMIT";
const ENV_USER_AGENT: &str = "STOCK_USER_AGENT";

/// Configuration for market data operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Time budget for a single upstream call
    pub request_timeout: Duration,

    /// How long a `(ticker, period)` snapshot stays memoized
    pub cache_ttl: Duration,

    /// Requests per minute allowed against the international provider
    pub international_rate_limit: u32,

    /// User-Agent header sent to every upstream
    pub user_agent: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300), // 5 minutes
            international_rate_limit: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Load configuration from `STOCK_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(secs) = env_number::<u64>(ENV_REQUEST_TIMEOUT)? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_number::<u64>(ENV_CACHE_TTL)? {
            builder = builder.cache_ttl(Duration::from_secs(secs));
        }
        if let Some(limit) = env_number::<u32>(ENV_INTL_RATE_LIMIT)? {
            builder = builder.international_rate_limit(limit);
        }
        if let Ok(agent) = std::env::var(ENV_USER_AGENT) {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.cache_ttl.is_zero() {
            return Err(StockError::ConfigError(
                "cache_ttl must be greater than 0".to_string(),
            ));
        }

        if self.international_rate_limit == 0 {
            return Err(StockError::ConfigError(
                "international_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(StockError::ConfigError(
                "user_agent must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| StockError::ConfigError(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    request_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    international_rate_limit: Option<u32>,
    user_agent: Option<String>,
}

impl StockConfigBuilder {
    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the snapshot memo window
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set the international provider rate limit (requests per minute)
    pub fn international_rate_limit(mut self, per_minute: u32) -> Self {
        self.international_rate_limit = Some(per_minute);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            international_rate_limit: self
                .international_rate_limit
                .unwrap_or(defaults.international_rate_limit),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }
}
