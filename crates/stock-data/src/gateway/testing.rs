//! In-memory sources for exercising the gateway without network access
//!
//! A `None` field makes the matching upstream call fail.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

use super::source::{
    AShareKline, AShareProfile, AShareSpot, DomesticSource, InternationalSource, ReportRow,
    StatementKind, TickerBar, TickerProfile, ValuationIndicator, ValuationPoint,
};
use crate::error::{Result, StockError};
use crate::model::StatementPeriod;

#[derive(Default)]
struct CallLog {
    counts: Mutex<HashMap<&'static str, usize>>,
}

impl CallLog {
    fn record(&self, name: &'static str) {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(name).or_default() += 1;
        }
    }

    fn count(&self, name: &str) -> usize {
        self.counts
            .lock()
            .map(|counts| counts.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

fn scripted<T: Clone>(provider: &str, name: &str, value: &Option<T>) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| StockError::upstream(provider, format!("{name} scripted to fail")))
}

pub(crate) fn kline(date: &str, close: f64) -> AShareKline {
    AShareKline {
        date: date.to_string(),
        open: close,
        close,
        high: close,
        low: close,
        volume: 1_000.0,
    }
}

pub(crate) fn report_row(report_date: &str, extra: &[(&str, Value)]) -> ReportRow {
    let mut row = Map::new();
    row.insert("REPORT_DATE".to_string(), json!(report_date));
    for (key, value) in extra {
        row.insert((*key).to_string(), value.clone());
    }
    row
}

pub(crate) fn ticker_bar(timestamp: i64, close: f64) -> TickerBar {
    TickerBar {
        timestamp,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000,
    }
}

fn report_rows(count: usize, source: &str) -> Vec<ReportRow> {
    (0..count)
        .map(|i| {
            let year = 2024 - (i / 4) as i32;
            let month = [3, 12, 9, 6][i % 4];
            let year = if month == 3 { year } else { year - 1 };
            let day = if month == 3 || month == 12 { 31 } else { 30 };
            report_row(
                &format!("{year}-{month:02}-{day} 00:00:00"),
                &[("SOURCE", json!(source)), ("TOTAL", json!(100.0 + i as f64))],
            )
        })
        .collect()
}

/// Scriptable A-share source
pub(crate) struct FakeDomestic {
    pub profile: Option<AShareProfile>,
    pub spot: Option<AShareSpot>,
    pub klines: Option<Vec<AShareKline>>,
    pub pe_points: Option<Vec<ValuationPoint>>,
    pub pb_points: Option<Vec<ValuationPoint>>,
    pub statements: Option<Vec<ReportRow>>,
    pub fail_statement: Option<StatementKind>,
    pub indicators: Option<Vec<ReportRow>>,
    pub forecast: Option<Vec<ReportRow>>,
    pub quarterly: Option<Vec<ReportRow>>,
    calls: CallLog,
    window: Mutex<Option<(NaiveDate, NaiveDate)>>,
}

impl FakeDomestic {
    pub fn healthy() -> Self {
        Self {
            profile: Some(AShareProfile {
                name: Some("Kweichow Moutai".to_string()),
                market_cap: Some(1.9e12),
                pe_dynamic: Some(28.0),
                pb: Some(9.5),
                industry: Some("Liquor".to_string()),
            }),
            spot: Some(AShareSpot {
                code: "600519".to_string(),
                name: Some("Moutai Spot".to_string()),
                price: Some(1500.0),
                change_percent: Some(1.25),
                pe_dynamic: Some(29.0),
                pb: Some(9.6),
            }),
            klines: Some(vec![
                kline("2024-06-12", 1480.0),
                kline("2024-06-13", 1490.0),
                kline("2024-06-14", 1500.0),
            ]),
            pe_points: Some(vec![
                ValuationPoint {
                    date: "2024-06-13".to_string(),
                    value: Some(31.0),
                },
                ValuationPoint {
                    date: "2024-06-14".to_string(),
                    value: Some(30.5),
                },
            ]),
            pb_points: Some(vec![ValuationPoint {
                date: "2024-06-14".to_string(),
                value: Some(8.75),
            }]),
            statements: Some(report_rows(10, "statement")),
            fail_statement: None,
            indicators: Some(vec![report_row(
                "2024-03-31 00:00:00",
                &[
                    ("ROEJQ", json!(8.3)),
                    ("ZZCJLL", json!(6.1)),
                    ("XSMLL", json!(91.9)),
                    ("XSJLL", json!(52.2)),
                    ("ZCFZL", json!(14.2)),
                    ("LD", json!("4.1")),
                    ("SD", json!(3.3)),
                    ("CHZZL", Value::Null),
                    ("YSZKZZL", json!(1200.0)),
                    ("TOAZZL", json!(0.2)),
                    ("TOTALOPERATEREVETZ", json!(18.0)),
                    ("PARENTNETPROFITTZ", json!(15.7)),
                ],
            )]),
            forecast: Some(report_rows(6, "profit_forecast")),
            quarterly: Some(report_rows(6, "quarterly_report")),
            calls: CallLog::default(),
            window: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            profile: None,
            spot: None,
            klines: None,
            pe_points: None,
            pb_points: None,
            statements: None,
            fail_statement: None,
            indicators: None,
            forecast: None,
            quarterly: None,
            calls: CallLog::default(),
            window: Mutex::new(None),
        }
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.count(name)
    }

    /// Date window of the most recent `daily_bars` call
    pub fn last_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.window.lock().ok().and_then(|w| *w)
    }
}

#[async_trait]
impl DomesticSource for FakeDomestic {
    fn id(&self) -> &'static str {
        "fake-domestic"
    }

    async fn profile(&self, _code: &str) -> Result<AShareProfile> {
        self.calls.record("profile");
        scripted(self.id(), "profile", &self.profile)
    }

    async fn spot_quote(&self, _code: &str) -> Result<AShareSpot> {
        self.calls.record("spot_quote");
        scripted(self.id(), "spot_quote", &self.spot)
    }

    async fn daily_bars(
        &self,
        _code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AShareKline>> {
        self.calls.record("daily_bars");
        if let Ok(mut window) = self.window.lock() {
            *window = Some((start, end));
        }
        scripted(self.id(), "daily_bars", &self.klines)
    }

    async fn valuation(
        &self,
        _code: &str,
        indicator: ValuationIndicator,
    ) -> Result<Vec<ValuationPoint>> {
        self.calls.record("valuation");
        match indicator {
            ValuationIndicator::PeTtm => scripted(self.id(), "valuation", &self.pe_points),
            ValuationIndicator::Pb => scripted(self.id(), "valuation", &self.pb_points),
        }
    }

    async fn statement(
        &self,
        _code: &str,
        kind: StatementKind,
        _limit: usize,
    ) -> Result<Vec<ReportRow>> {
        self.calls.record("statement");
        if self.fail_statement == Some(kind) {
            return Err(StockError::upstream(self.id(), "statement scripted to fail"));
        }
        scripted(self.id(), "statement", &self.statements)
    }

    async fn financial_indicators(&self, _code: &str) -> Result<Vec<ReportRow>> {
        self.calls.record("financial_indicators");
        scripted(self.id(), "financial_indicators", &self.indicators)
    }

    async fn profit_forecast(&self, _code: &str) -> Result<Vec<ReportRow>> {
        self.calls.record("profit_forecast");
        scripted(self.id(), "profit_forecast", &self.forecast)
    }

    async fn quarterly_report(&self, _code: &str) -> Result<Vec<ReportRow>> {
        self.calls.record("quarterly_report");
        scripted(self.id(), "quarterly_report", &self.quarterly)
    }
}

/// Scriptable international source
pub(crate) struct FakeInternational {
    pub bars: Option<Vec<TickerBar>>,
    pub profile: Option<TickerProfile>,
    pub statements: Option<Vec<StatementPeriod>>,
    pub fail_statement: Option<StatementKind>,
    calls: CallLog,
    range: Mutex<Option<String>>,
}

impl FakeInternational {
    pub fn profile() -> TickerProfile {
        TickerProfile {
            long_name: Some("Apple Inc.".to_string()),
            short_name: Some("Apple".to_string()),
            exchange: Some("NMS".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Consumer Electronics".to_string()),
            current_price: Some(189.5),
            regular_market_price: Some(189.0),
            regular_market_change_percent: Some(0.015),
            market_cap: Some(2.9e12),
            trailing_pe: Some(30.0),
            forward_pe: Some(28.0),
            price_to_book: Some(45.0),
            dividend_yield: Some(0.005),
            beta: Some(1.2),
            fifty_two_week_high: Some(200.0),
            fifty_two_week_low: Some(160.0),
            return_on_equity: Some(1.5),
            return_on_assets: Some(0.22),
            gross_margins: Some(0.45),
            operating_margins: Some(0.3),
            profit_margins: Some(0.25),
            debt_to_equity: Some(150.0),
            current_ratio: Some(0.95),
            quick_ratio: Some(0.8),
            trailing_eps: Some(6.4),
            book_value: Some(4.4),
            payout_ratio: Some(0.15),
            revenue_growth: Some(0.05),
            earnings_growth: None,
        }
    }

    pub fn healthy() -> Self {
        let statements = (0..6)
            .map(|i| {
                let mut items = Map::new();
                items.insert("totalAssets".to_string(), json!(3.5e11 - i as f64 * 1e10));
                StatementPeriod {
                    period: format!("{}-09-30", 2024 - i),
                    items,
                }
            })
            .collect();

        Self {
            bars: Some(vec![
                ticker_bar(1_718_283_600, 100.0),
                ticker_bar(1_718_370_000, 110.0),
            ]),
            profile: Some(Self::profile()),
            statements: Some(statements),
            fail_statement: None,
            calls: CallLog::default(),
            range: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            bars: None,
            profile: None,
            statements: None,
            fail_statement: None,
            calls: CallLog::default(),
            range: Mutex::new(None),
        }
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.count(name)
    }

    /// Range passed to the most recent `history` call
    pub fn last_range(&self) -> Option<String> {
        self.range.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl InternationalSource for FakeInternational {
    fn id(&self) -> &'static str {
        "fake-international"
    }

    async fn history(&self, _symbol: &str, range: &str) -> Result<Vec<TickerBar>> {
        self.calls.record("history");
        if let Ok(mut last) = self.range.lock() {
            *last = Some(range.to_string());
        }
        scripted(self.id(), "history", &self.bars)
    }

    async fn profile(&self, _symbol: &str) -> Result<TickerProfile> {
        self.calls.record("profile");
        scripted(self.id(), "profile", &self.profile)
    }

    async fn statement(&self, _symbol: &str, kind: StatementKind) -> Result<Vec<StatementPeriod>> {
        self.calls.record("statement");
        if self.fail_statement == Some(kind) {
            return Err(StockError::upstream(self.id(), "statement scripted to fail"));
        }
        scripted(self.id(), "statement", &self.statements)
    }
}
