//! Normalized quote and descriptive information

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::market::Market;

/// Upper bound accepted for a price/earnings ratio
pub const PE_CEILING: f64 = 1000.0;
/// Upper bound accepted for a price/book ratio
pub const PB_CEILING: f64 = 100.0;

/// Descriptive and valuation snapshot for one ticker
///
/// Every numeric field is independently optional; market-specific extras
/// simply stay unavailable for the market that does not provide them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteInfo {
    pub symbol: String,
    pub name: String,
    pub market: Market,
    pub exchange: Option<String>,
    pub current_price: Metric,
    pub change_percent: Metric,
    pub pe_ratio: Metric,
    pub pb_ratio: Metric,
    pub market_cap: Metric,
    pub dividend_yield: Metric,
    pub beta: Metric,
    #[serde(rename = "52_week_high")]
    pub week_52_high: Metric,
    #[serde(rename = "52_week_low")]
    pub week_52_low: Metric,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl QuoteInfo {
    /// Name used when no upstream supplied one
    pub fn placeholder_name(symbol: &str) -> String {
        format!("Stock{symbol}")
    }
}

/// Accumulates [`QuoteInfo`] fields from independent enrichment steps
///
/// Starts with every field unavailable. Setters that carry "if unset"
/// semantics never overwrite a value an earlier step already filled.
#[derive(Debug, Clone)]
pub struct QuoteInfoBuilder {
    info: QuoteInfo,
    name: Option<String>,
}

impl QuoteInfoBuilder {
    pub fn new(symbol: impl Into<String>, market: Market) -> Self {
        Self {
            info: QuoteInfo {
                symbol: symbol.into(),
                name: String::new(),
                market,
                exchange: None,
                current_price: Metric::Unavailable,
                change_percent: Metric::Unavailable,
                pe_ratio: Metric::Unavailable,
                pb_ratio: Metric::Unavailable,
                market_cap: Metric::Unavailable,
                dividend_yield: Metric::Unavailable,
                beta: Metric::Unavailable,
                week_52_high: Metric::Unavailable,
                week_52_low: Metric::Unavailable,
                sector: None,
                industry: None,
            },
            name: None,
        }
    }

    /// Set the display name unless one is already present
    pub fn name_if_unset(&mut self, name: Option<&str>) {
        if self.name.is_some() {
            return;
        }
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty() && *n != "-") {
            self.name = Some(name.to_string());
        }
    }

    /// Overwrite the current price when the new value is usable
    pub fn current_price(&mut self, price: Option<f64>) {
        set_if_available(&mut self.info.current_price, price);
    }

    /// Overwrite the percent change when the new value is usable
    pub fn change_percent(&mut self, change: Option<f64>) {
        set_if_available(&mut self.info.change_percent, change);
    }

    pub fn market_cap(&mut self, cap: Option<f64>) {
        set_if_available(&mut self.info.market_cap, cap);
    }

    /// Fill P/E if still unavailable and the value is in `(0, 1000]`
    ///
    /// Returns whether the field is available afterwards.
    pub fn pe_ratio_if_unset(&mut self, pe: Option<f64>) -> bool {
        if !self.info.pe_ratio.is_available() {
            self.info.pe_ratio = Metric::bounded(pe, 0.0, PE_CEILING);
        }
        self.info.pe_ratio.is_available()
    }

    /// Fill P/B if still unavailable and the value is in `(0, 100]`
    pub fn pb_ratio_if_unset(&mut self, pb: Option<f64>) -> bool {
        if !self.info.pb_ratio.is_available() {
            self.info.pb_ratio = Metric::bounded(pb, 0.0, PB_CEILING);
        }
        self.info.pb_ratio.is_available()
    }

    pub fn dividend_yield(&mut self, value: Option<f64>) {
        set_if_available(&mut self.info.dividend_yield, value);
    }

    pub fn beta(&mut self, value: Option<f64>) {
        set_if_available(&mut self.info.beta, value);
    }

    pub fn week_52_range(&mut self, high: Option<f64>, low: Option<f64>) {
        set_if_available(&mut self.info.week_52_high, high);
        set_if_available(&mut self.info.week_52_low, low);
    }

    pub fn exchange(&mut self, exchange: Option<&str>) {
        if let Some(exchange) = non_blank(exchange) {
            self.info.exchange = Some(exchange);
        }
    }

    pub fn sector(&mut self, sector: Option<&str>) {
        if let Some(sector) = non_blank(sector) {
            self.info.sector = Some(sector);
        }
    }

    pub fn industry(&mut self, industry: Option<&str>) {
        if let Some(industry) = non_blank(industry) {
            self.info.industry = Some(industry);
        }
    }

    pub fn has_price(&self) -> bool {
        self.info.current_price.is_available()
    }

    pub fn has_change_percent(&self) -> bool {
        self.info.change_percent.is_available()
    }

    pub fn has_pe_ratio(&self) -> bool {
        self.info.pe_ratio.is_available()
    }

    pub fn has_pb_ratio(&self) -> bool {
        self.info.pb_ratio.is_available()
    }

    /// Finish the record, synthesizing a placeholder name if none was found
    pub fn build(self) -> QuoteInfo {
        let Self { mut info, name } = self;
        info.name = name.unwrap_or_else(|| QuoteInfo::placeholder_name(&info.symbol));
        info
    }
}

fn set_if_available(field: &mut Metric, value: Option<f64>) {
    let metric = Metric::from(value);
    if metric.is_available() {
        *field = metric;
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "-")
        .map(ToString::to_string)
}
