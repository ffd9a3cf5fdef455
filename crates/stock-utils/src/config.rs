//! Application-level configuration

use serde::{Deserialize, Serialize};

/// Main configuration structure shared by the binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Tracing filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-scope".to_string(),
            environment: "development".to_string(),
            log_filter: "warn,stock_data=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, keeping defaults for unset variables
    ///
    /// Reads `APP_ENV` and `RUST_LOG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(environment) = std::env::var("APP_ENV") {
            if !environment.trim().is_empty() {
                config.environment = environment;
            }
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }
        config
    }

    /// Whether the binaries run in production mode
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
