//! API clients for market data providers

pub mod baidu;
pub mod eastmoney;
pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::gateway::{
    AShareKline, AShareProfile, AShareSpot, DomesticSource, InternationalSource, ReportRow,
    StatementKind, TickerBar, TickerProfile, ValuationIndicator, ValuationPoint,
};
use crate::model::StatementPeriod;

pub use baidu::BaiduValuationClient;
pub use eastmoney::EastmoneyClient;
pub use yahoo::YahooFinanceClient;

/// HTTP client bounded by the configured timeout
pub(crate) fn http_client(config: &StockConfig, cookies: bool) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.as_str())
        .cookie_store(cookies)
        .build()?)
}

/// Classify a failed send: timeouts get their own variant
pub(crate) fn request_error(provider: &str, err: reqwest::Error) -> StockError {
    if err.is_timeout() {
        StockError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        StockError::NetworkError(err)
    }
}

/// Production A-share source: Eastmoney for quotes, bars and reports, Baidu
/// for valuation history
#[derive(Debug, Clone)]
pub struct AShareSource {
    eastmoney: EastmoneyClient,
    baidu: BaiduValuationClient,
}

impl AShareSource {
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            eastmoney: EastmoneyClient::new(config)?,
            baidu: BaiduValuationClient::new(config)?,
        })
    }
}

#[async_trait]
impl DomesticSource for AShareSource {
    fn id(&self) -> &'static str {
        "eastmoney+baidu"
    }

    async fn profile(&self, code: &str) -> Result<AShareProfile> {
        self.eastmoney.stock_detail(code).await
    }

    async fn spot_quote(&self, code: &str) -> Result<AShareSpot> {
        self.eastmoney.spot(code).await
    }

    async fn daily_bars(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AShareKline>> {
        self.eastmoney.klines(code, start, end).await
    }

    async fn valuation(
        &self,
        code: &str,
        indicator: ValuationIndicator,
    ) -> Result<Vec<ValuationPoint>> {
        self.baidu.valuation_history(code, indicator).await
    }

    async fn statement(
        &self,
        code: &str,
        kind: StatementKind,
        limit: usize,
    ) -> Result<Vec<ReportRow>> {
        self.eastmoney.statement(code, kind, limit).await
    }

    async fn financial_indicators(&self, code: &str) -> Result<Vec<ReportRow>> {
        self.eastmoney.financial_indicators(code).await
    }

    async fn profit_forecast(&self, code: &str) -> Result<Vec<ReportRow>> {
        self.eastmoney.profit_forecast(code).await
    }

    async fn quarterly_report(&self, code: &str) -> Result<Vec<ReportRow>> {
        self.eastmoney.quarterly_report(code).await
    }
}

#[async_trait]
impl InternationalSource for YahooFinanceClient {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    async fn history(&self, symbol: &str, range: &str) -> Result<Vec<TickerBar>> {
        self.get_history(symbol, range).await
    }

    async fn profile(&self, symbol: &str) -> Result<TickerProfile> {
        self.get_profile(symbol).await
    }

    async fn statement(&self, symbol: &str, kind: StatementKind) -> Result<Vec<StatementPeriod>> {
        self.get_statement(symbol, kind).await
    }
}
