//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Initialize tracing subscriber with default configuration
///
/// Honours `RUST_LOG` and falls back to `info`.
pub fn init_tracing() {
    init_tracing_with("info");
}

/// Initialize tracing subscriber, using `default_filter` when `RUST_LOG` is unset
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_tracing_with(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

/// Initialize tracing from application config
///
/// Production emits one JSON object per event; other environments use the
/// human-readable format.
pub fn init_tracing_for(config: &Config) {
    if !config.is_production() {
        init_tracing_with(&config.log_filter);
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().json().with_target(true))
        .try_init();
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}
