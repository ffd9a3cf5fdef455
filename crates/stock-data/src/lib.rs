//! Market data normalization and technical indicators
//!
//! This crate fetches quote info, daily price history and financial
//! statements for Chinese A-shares and international equities, normalizes
//! both upstream shapes into one model and enriches price history with a
//! fixed set of technical indicators. It includes:
//!
//! - Market classification from the ticker alone (six-digit codes are A-shares)
//! - Quote info that degrades field by field when an upstream step fails
//! - Daily OHLCV history for `1y`, `6mo`, `3mo` and `1mo` lookbacks
//! - Moving averages, RSI, MACD, Bollinger Bands, KD and volume ratios
//! - Balance sheet, income, cash flow and ratio documents
//! - A TTL snapshot cache and an orchestration boundary for analysis passes
//!
//! # Architecture
//!
//! [`MarketDataGateway`] routes requests to a [`DomesticSource`] or an
//! [`InternationalSource`]; production sources live in [`api`]. The
//! [`indicators`] stage is pure. [`StockDataService`] composes both and is
//! what callers normally hold.
//!
//! # Example
//!
//! ```rust,ignore
//! use stock_data::{Period, StockConfig, StockDataService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StockConfig::from_env()?;
//!     let service = StockDataService::from_config(&config)?;
//!
//!     let snapshot = service.load_snapshot("600519", Period::SixMonths).await;
//!     if let Some(latest) = snapshot.latest {
//!         println!("{} RSI {}", snapshot.info.name, latest.rsi);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod indicators;
pub mod market;
pub mod model;
pub mod service;

// Re-export main types for convenience
pub use cache::{SnapshotCache, SnapshotKey};
pub use config::{StockConfig, StockConfigBuilder};
pub use engine::{
    AnalysisContext, AnalysisPass, PassReport, Rating, Recommendation, ReportSynthesizer,
    StockAnalysisEngine,
};
pub use error::{Result, StockError};
pub use gateway::{DomesticSource, InternationalSource, MarketDataGateway};
pub use indicators::{
    EnrichedSeries, Indicator, LatestIndicators, compute_indicators, latest_snapshot,
};
pub use market::{Market, classify};
pub use model::{
    Bar, FinancialBundle, FinancialRatios, Metric, Period, PriceSeries, QuoteInfo,
    StatementPeriod, StatementTable,
};
pub use service::{MarketSnapshot, StockDataService};
