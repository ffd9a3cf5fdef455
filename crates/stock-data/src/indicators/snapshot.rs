//! Flat view of the final row of an enriched series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::engine::{EnrichedSeries, Indicator};
use crate::error::{Result, StockError};
use crate::model::Metric;

/// Latest price, volume and indicator values
///
/// Columns still in warm-up on a short series stay unavailable here too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestIndicators {
    pub date: NaiveDate,
    pub price: Metric,
    pub volume: Metric,
    #[serde(rename = "MA5")]
    pub ma5: Metric,
    #[serde(rename = "MA10")]
    pub ma10: Metric,
    #[serde(rename = "MA20")]
    pub ma20: Metric,
    #[serde(rename = "MA60")]
    pub ma60: Metric,
    #[serde(rename = "RSI")]
    pub rsi: Metric,
    #[serde(rename = "MACD")]
    pub macd: Metric,
    #[serde(rename = "MACD_signal")]
    pub macd_signal: Metric,
    #[serde(rename = "MACD_histogram")]
    pub macd_histogram: Metric,
    #[serde(rename = "BB_upper")]
    pub bb_upper: Metric,
    #[serde(rename = "BB_middle")]
    pub bb_middle: Metric,
    #[serde(rename = "BB_lower")]
    pub bb_lower: Metric,
    #[serde(rename = "K")]
    pub k_value: Metric,
    #[serde(rename = "D")]
    pub d_value: Metric,
    #[serde(rename = "Volume_MA5")]
    pub volume_ma5: Metric,
    #[serde(rename = "Volume_ratio")]
    pub volume_ratio: Metric,
}

impl LatestIndicators {
    /// Every value with its column name, price and volume first
    pub fn entries(&self) -> [(&'static str, Metric); 17] {
        [
            ("price", self.price),
            ("volume", self.volume),
            ("MA5", self.ma5),
            ("MA10", self.ma10),
            ("MA20", self.ma20),
            ("MA60", self.ma60),
            ("RSI", self.rsi),
            ("MACD", self.macd),
            ("MACD_signal", self.macd_signal),
            ("MACD_histogram", self.macd_histogram),
            ("BB_upper", self.bb_upper),
            ("BB_middle", self.bb_middle),
            ("BB_lower", self.bb_lower),
            ("K", self.k_value),
            ("D", self.d_value),
            ("Volume_MA5", self.volume_ma5),
            ("Volume_ratio", self.volume_ratio),
        ]
    }

    /// Look a value up by column name (`price`, `volume`, `MA5`, `RSI`, ...)
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Copy the last row of an enriched series
pub fn latest_snapshot(enriched: &EnrichedSeries) -> Result<LatestIndicators> {
    let last = enriched.series().last().ok_or(StockError::EmptySeries)?;
    let index = enriched.len() - 1;
    let at = |indicator| enriched.value_at(indicator, index);

    Ok(LatestIndicators {
        date: last.date,
        price: Metric::new(last.close),
        volume: Metric::new(last.volume),
        ma5: at(Indicator::Ma5),
        ma10: at(Indicator::Ma10),
        ma20: at(Indicator::Ma20),
        ma60: at(Indicator::Ma60),
        rsi: at(Indicator::Rsi),
        macd: at(Indicator::Macd),
        macd_signal: at(Indicator::MacdSignal),
        macd_histogram: at(Indicator::MacdHistogram),
        bb_upper: at(Indicator::BbUpper),
        bb_middle: at(Indicator::BbMiddle),
        bb_lower: at(Indicator::BbLower),
        k_value: at(Indicator::K),
        d_value: at(Indicator::D),
        volume_ma5: at(Indicator::VolumeMa5),
        volume_ratio: at(Indicator::VolumeRatio),
    })
}
