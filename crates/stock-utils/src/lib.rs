//! Shared utilities for stock-scope
//!
//! This crate provides common functionality used across the stock-scope workspace,
//! including logging setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{init_tracing, init_tracing_for, init_tracing_with};
