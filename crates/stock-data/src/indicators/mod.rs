//! Technical indicator engine
//!
//! Unlike the gateway, this stage is all-or-nothing: indicator columns
//! depend on each other, so a failed computation yields a single error
//! rather than a partially populated series.

pub mod engine;
pub mod snapshot;

pub use engine::{EnrichedSeries, Indicator, NEUTRAL_RSI, compute_indicators};
pub use snapshot::{LatestIndicators, latest_snapshot};
