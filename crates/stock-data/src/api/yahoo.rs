//! Yahoo Finance API client
//!
//! Daily bars come through the `yahoo_finance_api` connector. The info
//! document and statements come from the `quoteSummary` endpoint, which
//! needs a session cookie plus a crumb token.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Map, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use super::{http_client, request_error};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::gateway::{StatementKind, TickerBar, TickerProfile};
use crate::model::StatementPeriod;

const PROVIDER: &str = "yahoo";

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

const PROFILE_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";
const DAILY_INTERVAL: &str = "1d";
/// Longest plausible crumb; anything longer is an HTML error page
const MAX_CRUMB_LEN: usize = 64;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// quoteSummary module and the array inside it holding the statements
fn statement_module(kind: StatementKind) -> (&'static str, &'static str) {
    match kind {
        StatementKind::BalanceSheet => ("balanceSheetHistory", "balanceSheetStatements"),
        StatementKind::IncomeStatement => ("incomeStatementHistory", "incomeStatementHistory"),
        StatementKind::CashFlow => ("cashflowStatementHistory", "cashflowStatements"),
    }
}

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    connector: yahoo::YahooConnector,
    http: Client,
    crumb: Mutex<Option<String>>,
    rate_limiter: SharedRateLimiter,
    request_timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a client with its own cookie jar and rate limiter
    pub fn with_config(config: &StockConfig) -> Result<Self> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| StockError::upstream(PROVIDER, e.to_string()))?;

        let per_minute = NonZeroU32::new(config.international_rate_limit).ok_or_else(|| {
            StockError::ConfigError("international_rate_limit must be greater than 0".to_string())
        })?;

        Ok(Self {
            connector,
            http: http_client(config, true)?,
            crumb: Mutex::new(None),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            request_timeout: config.request_timeout,
        })
    }

    /// Daily bars over a provider range such as `1y` or `5d`
    pub async fn get_history(&self, symbol: &str, range: &str) -> Result<Vec<TickerBar>> {
        self.rate_limiter.until_ready().await;
        debug!(symbol, range, "Requesting Yahoo quote range");

        let response = timeout(
            self.request_timeout,
            self.connector.get_quote_range(symbol, DAILY_INTERVAL, range),
        )
        .await
        .map_err(|_| StockError::Timeout {
            provider: PROVIDER.to_string(),
        })?
        .map_err(|e| StockError::upstream(PROVIDER, e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::upstream(PROVIDER, e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| TickerBar {
                timestamp: q.timestamp as i64,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    /// Descriptive info document
    pub async fn get_profile(&self, symbol: &str) -> Result<TickerProfile> {
        let summary = self.quote_summary(symbol, PROFILE_MODULES).await?;
        Ok(parse_profile(&summary))
    }

    /// Annual statements, newest first
    pub async fn get_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<Vec<StatementPeriod>> {
        let (module, _) = statement_module(kind);
        let summary = self.quote_summary(symbol, module).await?;
        parse_statements(&summary, kind)
    }

    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let crumb = self.crumb(false).await?;
        let mut response = self.summary_request(symbol, modules, &crumb).await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::TOO_MANY_REQUESTS
        ) {
            warn!(symbol, status = %response.status(), "Yahoo rejected crumb, refreshing once");
            let crumb = self.crumb(true).await?;
            response = self.summary_request(symbol, modules, &crumb).await?;
        }

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(StockError::RateLimitExceeded {
                provider: PROVIDER.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(StockError::upstream(
                PROVIDER,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let payload: Value = response.json().await?;
        summary_result(&payload)
    }

    async fn summary_request(&self, symbol: &str, modules: &str, crumb: &str) -> Result<Response> {
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");
        self.http
            .get(url)
            .query(&[("modules", modules), ("crumb", crumb)])
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, e))
    }

    /// Cached crumb, fetched on first use or when `refresh` is set
    async fn crumb(&self, refresh: bool) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        let crumb = self.fetch_crumb().await?;
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<String> {
        // Only the session cookie matters; fc.yahoo.com answers 404 regardless.
        if let Err(e) = self.http.get(COOKIE_URL).send().await {
            debug!(error = %e, "Yahoo cookie request failed");
        }

        for endpoint in CRUMB_URLS {
            let response = match self.http.get(endpoint).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!(endpoint, error = %e, "Crumb request failed");
                    continue;
                },
            };

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(StockError::RateLimitExceeded {
                    provider: PROVIDER.to_string(),
                });
            }
            if !response.status().is_success() {
                debug!(endpoint, status = %response.status(), "Crumb endpoint refused");
                continue;
            }

            let body = response.text().await?;
            if let Some(crumb) = valid_crumb(&body) {
                return Ok(crumb);
            }
        }

        Err(StockError::upstream(PROVIDER, "failed to obtain crumb"))
    }
}

fn valid_crumb(body: &str) -> Option<String> {
    let crumb = body.trim();
    (!crumb.is_empty() && crumb.len() <= MAX_CRUMB_LEN && !crumb.contains('<'))
        .then(|| crumb.to_string())
}

/// First result object of a quoteSummary payload
pub fn summary_result(payload: &Value) -> Result<Value> {
    if let Some(result) = payload.pointer("/quoteSummary/result/0") {
        return Ok(result.clone());
    }

    let description = payload
        .pointer("/quoteSummary/error/description")
        .and_then(Value::as_str)
        .unwrap_or("empty quoteSummary result");
    Err(StockError::upstream(PROVIDER, description))
}

/// Read a `{raw, fmt}` wrapper or a bare number
fn raw_number(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    value
        .get("raw")
        .and_then(Value::as_f64)
        .or_else(|| value.as_f64())
        .filter(|v| v.is_finite())
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Flatten the profile modules into a `TickerProfile`
pub fn parse_profile(summary: &Value) -> TickerProfile {
    let field = |module: &str, name: &str| summary.get(module).and_then(|m| m.get(name));
    let number = |module: &str, name: &str| raw_number(field(module, name));

    TickerProfile {
        long_name: text(field("price", "longName")),
        short_name: text(field("price", "shortName")),
        exchange: text(field("price", "exchange")),
        sector: text(field("assetProfile", "sector")),
        industry: text(field("assetProfile", "industry")),
        current_price: number("financialData", "currentPrice"),
        regular_market_price: number("price", "regularMarketPrice"),
        regular_market_change_percent: number("price", "regularMarketChangePercent"),
        market_cap: number("price", "marketCap").or_else(|| number("summaryDetail", "marketCap")),
        trailing_pe: number("summaryDetail", "trailingPE"),
        forward_pe: number("summaryDetail", "forwardPE")
            .or_else(|| number("defaultKeyStatistics", "forwardPE")),
        price_to_book: number("defaultKeyStatistics", "priceToBook"),
        dividend_yield: number("summaryDetail", "dividendYield"),
        beta: number("summaryDetail", "beta").or_else(|| number("defaultKeyStatistics", "beta")),
        fifty_two_week_high: number("summaryDetail", "fiftyTwoWeekHigh"),
        fifty_two_week_low: number("summaryDetail", "fiftyTwoWeekLow"),
        return_on_equity: number("financialData", "returnOnEquity"),
        return_on_assets: number("financialData", "returnOnAssets"),
        gross_margins: number("financialData", "grossMargins"),
        operating_margins: number("financialData", "operatingMargins"),
        profit_margins: number("financialData", "profitMargins"),
        debt_to_equity: number("financialData", "debtToEquity"),
        current_ratio: number("financialData", "currentRatio"),
        quick_ratio: number("financialData", "quickRatio"),
        trailing_eps: number("defaultKeyStatistics", "trailingEps"),
        book_value: number("defaultKeyStatistics", "bookValue"),
        payout_ratio: number("summaryDetail", "payoutRatio"),
        revenue_growth: number("financialData", "revenueGrowth"),
        earnings_growth: number("financialData", "earningsGrowth"),
    }
}

/// Pivot statement history entries into periods keyed by end date
pub fn parse_statements(summary: &Value, kind: StatementKind) -> Result<Vec<StatementPeriod>> {
    let (module, list) = statement_module(kind);
    let entries = summary
        .get(module)
        .and_then(|m| m.get(list))
        .and_then(Value::as_array)
        .ok_or_else(|| StockError::upstream(PROVIDER, format!("{module} missing")))?;

    let mut periods: Vec<StatementPeriod> = entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let period = text(entry.get("endDate")?.get("fmt"))?;
            let items: Map<String, Value> = entry
                .iter()
                .filter(|(key, _)| !matches!(key.as_str(), "endDate" | "maxAge"))
                .filter_map(|(key, value)| {
                    raw_number(Some(value)).map(|raw| (key.clone(), Value::from(raw)))
                })
                .collect();
            Some(StatementPeriod { period, items })
        })
        .collect();

    // ISO end dates sort chronologically as text.
    periods.sort_by(|a, b| b.period.cmp(&a.period));
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary() -> Value {
        json!({
            "price": {
                "longName": "Apple Inc.",
                "shortName": "Apple",
                "exchange": "NMS",
                "regularMarketPrice": {"raw": 189.0, "fmt": "189.00"},
                "regularMarketChangePercent": {"raw": 0.015, "fmt": "1.50%"},
                "marketCap": {"raw": 2.9e12, "fmt": "2.9T"}
            },
            "summaryDetail": {
                "trailingPE": {"raw": 30.1, "fmt": "30.10"},
                "forwardPE": {},
                "dividendYield": {"raw": 0.005},
                "beta": {"raw": 1.2},
                "fiftyTwoWeekHigh": {"raw": 200.0},
                "fiftyTwoWeekLow": {"raw": 160.0},
                "payoutRatio": {"raw": 0.15}
            },
            "defaultKeyStatistics": {
                "priceToBook": {"raw": 45.0},
                "forwardPE": {"raw": 28.0},
                "trailingEps": {"raw": 6.4},
                "bookValue": {"raw": 4.4}
            },
            "financialData": {
                "currentPrice": {"raw": 189.5},
                "returnOnEquity": {"raw": 1.5},
                "debtToEquity": {"raw": 150.0},
                "earningsGrowth": {}
            },
            "assetProfile": {
                "sector": "Technology",
                "industry": "Consumer Electronics"
            }
        })
    }

    #[test]
    fn test_parse_profile() {
        let profile = parse_profile(&summary());
        assert_eq!(profile.long_name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.exchange.as_deref(), Some("NMS"));
        assert_eq!(profile.current_price, Some(189.5));
        assert_eq!(profile.regular_market_change_percent, Some(0.015));
        assert_eq!(profile.trailing_pe, Some(30.1));
        // Empty wrapper in summaryDetail falls back to key statistics.
        assert_eq!(profile.forward_pe, Some(28.0));
        assert_eq!(profile.price_to_book, Some(45.0));
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.earnings_growth, None);
        assert_eq!(profile.quick_ratio, None);
    }

    #[test]
    fn test_parse_statements_newest_first() {
        let summary = json!({
            "balanceSheetHistory": {
                "balanceSheetStatements": [
                    {
                        "maxAge": 1,
                        "endDate": {"raw": 1_664_496_000, "fmt": "2022-09-30"},
                        "totalAssets": {"raw": 3.5e11, "fmt": "350B"},
                        "goodWill": {}
                    },
                    {
                        "maxAge": 1,
                        "endDate": {"raw": 1_696_032_000, "fmt": "2023-09-30"},
                        "totalAssets": {"raw": 3.6e11, "fmt": "360B"}
                    }
                ]
            }
        });
        let periods = parse_statements(&summary, StatementKind::BalanceSheet).unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].period, "2023-09-30");
        assert_eq!(periods[0].items["totalAssets"], json!(3.6e11));
        assert!(!periods[1].items.contains_key("goodWill"));
        assert!(!periods[1].items.contains_key("maxAge"));

        assert!(parse_statements(&summary, StatementKind::CashFlow).is_err());
    }

    #[test]
    fn test_summary_result_error_description() {
        let payload = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}
            }
        });
        let err = summary_result(&payload).unwrap_err();
        assert!(err.to_string().contains("Quote not found"));

        let ok = json!({"quoteSummary": {"result": [{"price": {}}], "error": null}});
        assert!(summary_result(&ok).unwrap().get("price").is_some());
    }

    #[test]
    fn test_valid_crumb() {
        assert_eq!(valid_crumb("abc/DEF.1\n").as_deref(), Some("abc/DEF.1"));
        assert_eq!(valid_crumb(""), None);
        assert_eq!(valid_crumb("<html>Too Many Requests</html>"), None);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_history() {
        let client = YahooFinanceClient::with_config(&StockConfig::default()).unwrap();
        let bars = client.get_history("AAPL", "1mo").await.unwrap();
        assert!(!bars.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_profile() {
        let client = YahooFinanceClient::with_config(&StockConfig::default()).unwrap();
        let profile = client.get_profile("AAPL").await.unwrap();
        assert!(profile.long_name.is_some());
    }
}
