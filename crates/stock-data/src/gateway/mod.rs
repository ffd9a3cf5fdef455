//! Market Data Gateway
//!
//! Routes each request to the domestic or international fetch path and
//! normalizes both upstream shapes into the canonical model. Quote info and
//! financials degrade field by field; history either yields a whole series or
//! a call-level error.

pub mod domestic;
pub mod international;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{AShareSource, YahooFinanceClient};
use crate::config::StockConfig;
use crate::error::Result;
use crate::market::{Market, classify};
use crate::model::{FinancialBundle, Period, PriceSeries, QuoteInfo, parse_number};

pub use source::{
    AShareKline, AShareProfile, AShareSpot, DomesticSource, InternationalSource, ReportRow,
    StatementKind, TickerBar, TickerProfile, ValuationIndicator, ValuationPoint,
};

/// Entry point for quote, history and financial lookups
///
/// Holds no per-request state; every call starts from fresh inputs.
#[derive(Clone)]
pub struct MarketDataGateway {
    domestic: Arc<dyn DomesticSource>,
    international: Arc<dyn InternationalSource>,
}

impl MarketDataGateway {
    /// Create a gateway over explicit sources
    pub fn new(
        domestic: Arc<dyn DomesticSource>,
        international: Arc<dyn InternationalSource>,
    ) -> Self {
        Self {
            domestic,
            international,
        }
    }

    /// Create a gateway over the production upstream clients
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let domestic = AShareSource::new(config)?;
        let international = YahooFinanceClient::with_config(config)?;
        Ok(Self::new(Arc::new(domestic), Arc::new(international)))
    }

    /// Fetch descriptive and valuation info
    ///
    /// Never fails as a whole: whatever lookups succeed are kept and the rest
    /// of the fields stay unavailable.
    pub async fn fetch_quote_info(&self, ticker: &str) -> QuoteInfo {
        let market = classify(ticker);
        info!(symbol = ticker, %market, "Fetching quote info");
        match market {
            Market::Domestic => domestic::quote_info(&*self.domestic, ticker, today()).await,
            Market::International => international::quote_info(&*self.international, ticker).await,
        }
    }

    /// Fetch the daily OHLCV series for a lookback period
    pub async fn fetch_history(&self, ticker: &str, period: Period) -> Result<PriceSeries> {
        let market = classify(ticker);
        info!(symbol = ticker, %market, %period, "Fetching price history");
        match market {
            Market::Domestic => domestic::history(&*self.domestic, ticker, period, today()).await,
            Market::International => {
                international::history(&*self.international, ticker, period).await
            },
        }
    }

    /// Fetch the best-effort financial statement bundle
    pub async fn fetch_financials(&self, ticker: &str) -> FinancialBundle {
        let market = classify(ticker);
        info!(symbol = ticker, %market, "Fetching financial statements");
        let bundle = match market {
            Market::Domestic => domestic::financials(&*self.domestic, ticker).await,
            Market::International => international::financials(&*self.international, ticker).await,
        };
        info!(
            symbol = ticker,
            parts = bundle.available_parts(),
            "Financial bundle assembled"
        );
        bundle
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Run one enrichment step, logging and swallowing its failure
pub(crate) async fn soft_step<T, F>(symbol: &str, step: &str, fetch: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match fetch.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(symbol, step, error = %e, "Sub-fetch failed, its fields stay unavailable");
            None
        },
    }
}

/// Read a number from a loosely typed upstream JSON value
pub(crate) fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}
