//! Canonical OHLCV series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One trading day of price data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Daily bars for one symbol, ascending by date with no duplicate dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, sorting by date and keeping the last bar seen for a repeated date
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        // Stable sort keeps upstream order among equal dates, so "last wins" holds.
        bars.sort_by_key(|bar| bar.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// Lookback window accepted by the history fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Period {
    /// Parse a period label; anything outside the fixed set means one year
    pub fn parse(label: &str) -> Self {
        match label {
            "6mo" => Self::SixMonths,
            "3mo" => Self::ThreeMonths,
            "1mo" => Self::OneMonth,
            _ => Self::OneYear,
        }
    }

    /// Provider range vocabulary (`1y`, `6mo`, `3mo`, `1mo`)
    pub fn as_range(self) -> &'static str {
        match self {
            Self::OneYear => "1y",
            Self::SixMonths => "6mo",
            Self::ThreeMonths => "3mo",
            Self::OneMonth => "1mo",
        }
    }

    /// Calendar days requested from the domestic history endpoint
    ///
    /// One month deliberately requests a full year, like the unlisted periods.
    pub fn lookback_days(self) -> i64 {
        match self {
            Self::SixMonths => 180,
            Self::ThreeMonths => 90,
            Self::OneYear | Self::OneMonth => 365,
        }
    }
}

impl From<&str> for Period {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}
