//! Upstream source traits and their raw record shapes
//!
//! Each market has its own trait with one method per upstream query. The
//! records returned here still carry the upstream's structure; mapping them
//! into the canonical model is the gateway's job.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::StatementPeriod;

/// Raw report row as returned by the domestic statement provider
pub type ReportRow = Map<String, Value>;

/// Which financial statement to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [Self; 3] = [Self::BalanceSheet, Self::IncomeStatement, Self::CashFlow];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::CashFlow => "cash_flow",
        }
    }
}

/// Valuation series offered by the domestic valuation provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuationIndicator {
    /// Trailing-twelve-month price/earnings
    PeTtm,
    /// Price/book
    Pb,
}

/// Single-stock detail record (domestic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AShareProfile {
    pub name: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_dynamic: Option<f64>,
    pub pb: Option<f64>,
    pub industry: Option<String>,
}

/// Real-time quote snapshot (domestic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AShareSpot {
    pub code: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub pe_dynamic: Option<f64>,
    pub pb: Option<f64>,
}

/// One forward-adjusted daily kline, still in upstream field order
#[derive(Debug, Clone, PartialEq)]
pub struct AShareKline {
    pub date: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

/// One point of a valuation history
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationPoint {
    pub date: String,
    pub value: Option<f64>,
}

/// Domestic (A-share) market data provider
#[async_trait]
pub trait DomesticSource: Send + Sync {
    /// Identifier used in logs
    fn id(&self) -> &'static str;

    /// Descriptive detail for one code
    async fn profile(&self, code: &str) -> Result<AShareProfile>;

    /// Real-time price snapshot for one code
    async fn spot_quote(&self, code: &str) -> Result<AShareSpot>;

    /// Forward-adjusted daily bars between two calendar dates, inclusive
    async fn daily_bars(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AShareKline>>;

    /// Valuation history, oldest first
    async fn valuation(
        &self,
        code: &str,
        indicator: ValuationIndicator,
    ) -> Result<Vec<ValuationPoint>>;

    /// Statement report rows, newest first
    async fn statement(
        &self,
        code: &str,
        kind: StatementKind,
        limit: usize,
    ) -> Result<Vec<ReportRow>>;

    /// Main financial indicator rows, newest first
    async fn financial_indicators(&self, code: &str) -> Result<Vec<ReportRow>>;

    /// Earnings forecast rows (primary quarterly source)
    async fn profit_forecast(&self, code: &str) -> Result<Vec<ReportRow>>;

    /// Quarterly results rows (fallback quarterly source)
    async fn quarterly_report(&self, code: &str) -> Result<Vec<ReportRow>>;
}

/// One daily bar from the international provider
#[derive(Debug, Clone, PartialEq)]
pub struct TickerBar {
    /// Unix timestamp (seconds) of the session
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Descriptive info document from the international provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerProfile {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    /// Fractional day change (0.012 = 1.2%)
    pub regular_market_change_percent: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub profit_margins: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub book_value: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
}

/// International market data provider
#[async_trait]
pub trait InternationalSource: Send + Sync {
    /// Identifier used in logs
    fn id(&self) -> &'static str;

    /// Daily bars over a provider range such as `1y` or `5d`
    async fn history(&self, symbol: &str, range: &str) -> Result<Vec<TickerBar>>;

    /// Descriptive info document
    async fn profile(&self, symbol: &str) -> Result<TickerProfile>;

    /// Annual statement periods, newest first
    async fn statement(&self, symbol: &str, kind: StatementKind) -> Result<Vec<StatementPeriod>>;
}
