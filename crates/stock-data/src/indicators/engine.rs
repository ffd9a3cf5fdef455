//! Indicator columns over a canonical price series

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ta::indicators::{BollingerBands, ExponentialMovingAverage, FastStochastic, SimpleMovingAverage};
use ta::{DataItem, Next};
use tracing::debug;

use crate::error::{Result, StockError};
use crate::model::{Bar, Metric, PriceSeries};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEVS: f64 = 2.0;
pub const STOCHASTIC_PERIOD: usize = 14;
pub const STOCHASTIC_SMOOTHING: usize = 3;
pub const VOLUME_MA_PERIOD: usize = 5;

/// RSI reported when the window saw no price movement at all
pub const NEUTRAL_RSI: f64 = 50.0;

/// Derived column appended to a price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "MA5")]
    Ma5,
    #[serde(rename = "MA10")]
    Ma10,
    #[serde(rename = "MA20")]
    Ma20,
    #[serde(rename = "MA60")]
    Ma60,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "MACD_signal")]
    MacdSignal,
    #[serde(rename = "MACD_histogram")]
    MacdHistogram,
    #[serde(rename = "BB_upper")]
    BbUpper,
    #[serde(rename = "BB_middle")]
    BbMiddle,
    #[serde(rename = "BB_lower")]
    BbLower,
    K,
    D,
    #[serde(rename = "Volume_MA5")]
    VolumeMa5,
    #[serde(rename = "Volume_ratio")]
    VolumeRatio,
}

impl Indicator {
    pub const ALL: [Self; 15] = [
        Self::Ma5,
        Self::Ma10,
        Self::Ma20,
        Self::Ma60,
        Self::Rsi,
        Self::Macd,
        Self::MacdSignal,
        Self::MacdHistogram,
        Self::BbUpper,
        Self::BbMiddle,
        Self::BbLower,
        Self::K,
        Self::D,
        Self::VolumeMa5,
        Self::VolumeRatio,
    ];

    /// Column name
    pub fn name(self) -> &'static str {
        match self {
            Self::Ma5 => "MA5",
            Self::Ma10 => "MA10",
            Self::Ma20 => "MA20",
            Self::Ma60 => "MA60",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::MacdSignal => "MACD_signal",
            Self::MacdHistogram => "MACD_histogram",
            Self::BbUpper => "BB_upper",
            Self::BbMiddle => "BB_middle",
            Self::BbLower => "BB_lower",
            Self::K => "K",
            Self::D => "D",
            Self::VolumeMa5 => "Volume_MA5",
            Self::VolumeRatio => "Volume_ratio",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    /// Index of the first row that can carry a value
    pub fn first_defined_index(self) -> usize {
        match self {
            Self::Ma5 => 4,
            Self::Ma10 => 9,
            Self::Ma20 => 19,
            Self::Ma60 => 59,
            Self::Rsi => RSI_PERIOD,
            Self::Macd => MACD_SLOW - 1,
            Self::MacdSignal | Self::MacdHistogram => MACD_SLOW + MACD_SIGNAL - 2,
            Self::BbUpper | Self::BbMiddle | Self::BbLower => BOLLINGER_PERIOD - 1,
            Self::K => STOCHASTIC_PERIOD - 1,
            Self::D => STOCHASTIC_PERIOD + STOCHASTIC_SMOOTHING - 2,
            Self::VolumeMa5 | Self::VolumeRatio => VOLUME_MA_PERIOD - 1,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A price series plus one aligned column per indicator
///
/// Rows still inside an indicator's warm-up window hold
/// [`Metric::Unavailable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSeries {
    series: PriceSeries,
    columns: BTreeMap<Indicator, Vec<Metric>>,
}

impl EnrichedSeries {
    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// One indicator column, aligned with `series().bars()`
    pub fn column(&self, indicator: Indicator) -> &[Metric] {
        self.columns
            .get(&indicator)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Indicator value at a row; out-of-range rows are unavailable
    pub fn value_at(&self, indicator: Indicator, index: usize) -> Metric {
        self.column(indicator).get(index).copied().unwrap_or_default()
    }
}

fn indicator_error(err: impl fmt::Display) -> StockError {
    StockError::IndicatorError(err.to_string())
}

/// Compute every indicator column for a series
///
/// All-or-nothing: any unusable input fails the whole computation.
pub fn compute_indicators(series: &PriceSeries) -> Result<EnrichedSeries> {
    validate_bars(series.bars())?;

    let closes = series.closes();
    let volumes = series.volumes();

    let mut columns = BTreeMap::new();
    columns.insert(Indicator::Ma5, sma(&closes, 5)?);
    columns.insert(Indicator::Ma10, sma(&closes, 10)?);
    columns.insert(Indicator::Ma20, sma(&closes, 20)?);
    columns.insert(Indicator::Ma60, sma(&closes, 60)?);
    columns.insert(Indicator::Rsi, wilder_rsi(&closes, RSI_PERIOD));

    let (macd, signal, histogram) = macd(&closes)?;
    columns.insert(Indicator::Macd, macd);
    columns.insert(Indicator::MacdSignal, signal);
    columns.insert(Indicator::MacdHistogram, histogram);

    let (upper, middle, lower) = bollinger(&closes)?;
    columns.insert(Indicator::BbUpper, upper);
    columns.insert(Indicator::BbMiddle, middle);
    columns.insert(Indicator::BbLower, lower);

    let (k, d) = stochastic(series.bars())?;
    columns.insert(Indicator::K, k);
    columns.insert(Indicator::D, d);

    let volume_ma = sma(&volumes, VOLUME_MA_PERIOD)?;
    let volume_ratio = volumes
        .iter()
        .zip(&volume_ma)
        .map(|(volume, average)| match average.value() {
            Some(avg) if avg != 0.0 => Metric::new(volume / avg),
            _ => Metric::Unavailable,
        })
        .collect();
    columns.insert(Indicator::VolumeMa5, volume_ma);
    columns.insert(Indicator::VolumeRatio, volume_ratio);

    debug!(symbol = series.symbol(), bars = series.len(), "Computed indicator columns");

    Ok(EnrichedSeries {
        series: series.clone(),
        columns,
    })
}

fn validate_bars(bars: &[Bar]) -> Result<()> {
    for bar in bars {
        let fields = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
            ("volume", bar.volume),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(StockError::IndicatorError(format!(
                "{name} is not a finite number on {}",
                bar.date
            )));
        }
    }
    Ok(())
}

/// Keep a raw output only once `index` has cleared the warm-up
fn masked(index: usize, first_defined: usize, value: f64) -> Metric {
    if index >= first_defined {
        Metric::new(value)
    } else {
        Metric::Unavailable
    }
}

fn sma(values: &[f64], period: usize) -> Result<Vec<Metric>> {
    let mut average = SimpleMovingAverage::new(period).map_err(indicator_error)?;
    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &value)| masked(i, period - 1, average.next(value)))
        .collect())
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// RSI with Wilder smoothing, seeded by the simple average of the first
/// `period` changes
///
/// An exponential seed starting from the first change gives different early
/// values; both converge once a few dozen bars have been smoothed. The simple
/// seed keeps the first value a function of the first window alone.
fn wilder_rsi(closes: &[f64], period: usize) -> Vec<Metric> {
    let mut out = vec![Metric::Unavailable; closes.len()];
    if closes.len() <= period {
        return out;
    }

    let change = |i: usize| closes[i] - closes[i - 1];
    let weight = period as f64;

    let (mut avg_gain, mut avg_loss) = (1..=period).fold((0.0, 0.0), |(gain, loss), i| {
        let delta = change(i);
        (gain + delta.max(0.0), loss + (-delta).max(0.0))
    });
    avg_gain /= weight;
    avg_loss /= weight;
    out[period] = Metric::new(rsi_from_averages(avg_gain, avg_loss));

    for i in period + 1..closes.len() {
        let delta = change(i);
        avg_gain = (avg_gain * (weight - 1.0) + delta.max(0.0)) / weight;
        avg_loss = (avg_loss * (weight - 1.0) + (-delta).max(0.0)) / weight;
        out[i] = Metric::new(rsi_from_averages(avg_gain, avg_loss));
    }
    out
}

type Columns3 = (Vec<Metric>, Vec<Metric>, Vec<Metric>);

/// MACD line, its signal line (fed only with defined MACD values) and the histogram
fn macd(closes: &[f64]) -> Result<Columns3> {
    let mut fast = ExponentialMovingAverage::new(MACD_FAST).map_err(indicator_error)?;
    let mut slow = ExponentialMovingAverage::new(MACD_SLOW).map_err(indicator_error)?;
    let mut signal = ExponentialMovingAverage::new(MACD_SIGNAL).map_err(indicator_error)?;

    let macd_start = Indicator::Macd.first_defined_index();
    let signal_start = Indicator::MacdSignal.first_defined_index();

    let mut macd_col = Vec::with_capacity(closes.len());
    let mut signal_col = Vec::with_capacity(closes.len());
    let mut hist_col = Vec::with_capacity(closes.len());

    for (i, &close) in closes.iter().enumerate() {
        let line = fast.next(close) - slow.next(close);
        if i < macd_start {
            macd_col.push(Metric::Unavailable);
            signal_col.push(Metric::Unavailable);
            hist_col.push(Metric::Unavailable);
            continue;
        }

        let smoothed = signal.next(line);
        macd_col.push(Metric::new(line));
        signal_col.push(masked(i, signal_start, smoothed));
        hist_col.push(masked(i, signal_start, line - smoothed));
    }

    Ok((macd_col, signal_col, hist_col))
}

fn bollinger(closes: &[f64]) -> Result<Columns3> {
    let mut bands =
        BollingerBands::new(BOLLINGER_PERIOD, BOLLINGER_STD_DEVS).map_err(indicator_error)?;
    let start = Indicator::BbMiddle.first_defined_index();

    let mut upper = Vec::with_capacity(closes.len());
    let mut middle = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());
    for (i, &close) in closes.iter().enumerate() {
        let out = bands.next(close);
        upper.push(masked(i, start, out.upper));
        middle.push(masked(i, start, out.average));
        lower.push(masked(i, start, out.lower));
    }
    Ok((upper, middle, lower))
}

/// Fast %K and %D, the simple average of the last three defined %K values
fn stochastic(bars: &[Bar]) -> Result<(Vec<Metric>, Vec<Metric>)> {
    let mut fast_k = FastStochastic::new(STOCHASTIC_PERIOD).map_err(indicator_error)?;
    let mut smooth = SimpleMovingAverage::new(STOCHASTIC_SMOOTHING).map_err(indicator_error)?;
    let k_start = Indicator::K.first_defined_index();
    let d_start = Indicator::D.first_defined_index();

    let mut k_col = Vec::with_capacity(bars.len());
    let mut d_col = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let item = stochastic_item(bar)?;

        let k = fast_k.next(&item);
        if i < k_start {
            k_col.push(Metric::Unavailable);
            d_col.push(Metric::Unavailable);
            continue;
        }
        k_col.push(Metric::new(k));
        d_col.push(masked(i, d_start, smooth.next(k)));
    }
    Ok((k_col, d_col))
}

/// Build a `DataItem` whose range always contains its open and close
///
/// Adjusted upstream bars sometimes report a close a tick outside
/// `[low, high]`; only the stochastic reads the range, so it is widened here
/// instead of failing every column.
fn stochastic_item(bar: &Bar) -> Result<DataItem> {
    let high = bar.high.max(bar.open).max(bar.close);
    let low = bar.low.min(bar.open).min(bar.close);
    DataItem::builder()
        .open(bar.open)
        .high(high)
        .low(low)
        .close(bar.close)
        .volume(bar.volume.max(0.0))
        .build()
        .map_err(|e| StockError::IndicatorError(format!("unusable bar on {}: {e}", bar.date)))
}
