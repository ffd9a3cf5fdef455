//! Eastmoney quote, kline and data-center client

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{http_client, request_error};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::gateway::{
    AShareKline, AShareProfile, AShareSpot, ReportRow, StatementKind, json_number,
};

const PROVIDER: &str = "eastmoney";

const STOCK_DETAIL_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const SPOT_URL: &str = "https://push2.eastmoney.com/api/qt/ulist.np/get";
const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const DATACENTER_URL: &str = "https://datacenter-web.eastmoney.com/api/data/v1/get";

/// Public token the quote endpoints expect
const UT_TOKEN: &str = "fa5fd1943c7b386f172d6893dbfba10b";

// Quote field ids: code, name, total market cap, dynamic P/E, P/B, industry
const DETAIL_FIELDS: &str = "f57,f58,f116,f162,f167,f127";
// Spot field ids: price, change %, code, name, dynamic P/E, P/B
const SPOT_FIELDS: &str = "f2,f3,f12,f14,f9,f23";

/// Daily bars
const KLINE_DAILY: &str = "101";
/// Forward-adjusted prices
const KLINE_FORWARD_ADJUSTED: &str = "1";

/// Rows requested from report endpoints without an explicit limit
const DEFAULT_PAGE_SIZE: usize = 20;

/// One data-center report query
#[derive(Debug, Clone, Copy)]
struct Report {
    name: &'static str,
    sort_column: Option<&'static str>,
}

const BALANCE_REPORT: Report = Report {
    name: "RPT_DMSK_FN_BALANCE",
    sort_column: Some("REPORT_DATE"),
};
const INCOME_REPORT: Report = Report {
    name: "RPT_DMSK_FN_INCOME",
    sort_column: Some("REPORT_DATE"),
};
const CASHFLOW_REPORT: Report = Report {
    name: "RPT_DMSK_FN_CASHFLOW",
    sort_column: Some("REPORT_DATE"),
};
const INDICATOR_REPORT: Report = Report {
    name: "RPT_F10_FINANCE_MAINFINADATA",
    sort_column: Some("REPORT_DATE"),
};
const FORECAST_REPORT: Report = Report {
    name: "RPT_WEB_RESPREDICT",
    sort_column: None,
};
const QUARTERLY_REPORT: Report = Report {
    name: "RPT_LICO_FN_CPD",
    sort_column: Some("REPORTDATE"),
};

fn statement_report(kind: StatementKind) -> Report {
    match kind {
        StatementKind::BalanceSheet => BALANCE_REPORT,
        StatementKind::IncomeStatement => INCOME_REPORT,
        StatementKind::CashFlow => CASHFLOW_REPORT,
    }
}

/// Market-qualified security id: Shanghai codes start with 6 or 9
pub fn secid(code: &str) -> String {
    if code.starts_with('6') || code.starts_with('9') {
        format!("1.{code}")
    } else {
        format!("0.{code}")
    }
}

/// Eastmoney API client
#[derive(Debug, Clone)]
pub struct EastmoneyClient {
    client: Client,
}

impl EastmoneyClient {
    /// Create a new client bounded by the configured timeout
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config, false)?,
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(url, "Requesting Eastmoney endpoint");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(StockError::upstream(
                PROVIDER,
                format!("HTTP error: {}", response.status()),
            ));
        }

        Ok(response.json().await?)
    }

    /// Single-stock detail
    pub async fn stock_detail(&self, code: &str) -> Result<AShareProfile> {
        let query = [
            ("secid", secid(code)),
            ("fields", DETAIL_FIELDS.to_string()),
            ("fltt", "2".to_string()),
            ("invt", "2".to_string()),
            ("ut", UT_TOKEN.to_string()),
        ];
        let payload = self.get_json(STOCK_DETAIL_URL, &query).await?;
        parse_detail(&payload)
    }

    /// Real-time snapshot
    pub async fn spot(&self, code: &str) -> Result<AShareSpot> {
        let query = [
            ("secids", secid(code)),
            ("fields", SPOT_FIELDS.to_string()),
            ("fltt", "2".to_string()),
            ("invt", "2".to_string()),
            ("ut", UT_TOKEN.to_string()),
        ];
        let payload = self.get_json(SPOT_URL, &query).await?;
        parse_spot(code, &payload)
    }

    /// Forward-adjusted daily klines between two dates, inclusive
    pub async fn klines(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AShareKline>> {
        let query = [
            ("secid", secid(code)),
            ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
            ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61".to_string()),
            ("klt", KLINE_DAILY.to_string()),
            ("fqt", KLINE_FORWARD_ADJUSTED.to_string()),
            ("beg", start.format("%Y%m%d").to_string()),
            ("end", end.format("%Y%m%d").to_string()),
            ("ut", UT_TOKEN.to_string()),
        ];
        let payload = self.get_json(KLINE_URL, &query).await?;
        parse_klines(code, &payload)
    }

    async fn report(&self, report: Report, code: &str, limit: usize) -> Result<Vec<ReportRow>> {
        let mut query = vec![
            ("reportName", report.name.to_string()),
            ("columns", "ALL".to_string()),
            ("filter", format!("(SECURITY_CODE=\"{code}\")")),
            ("pageNumber", "1".to_string()),
            ("pageSize", limit.to_string()),
            ("source", "WEB".to_string()),
            ("client", "WEB".to_string()),
        ];
        if let Some(column) = report.sort_column {
            query.push(("sortColumns", column.to_string()));
            query.push(("sortTypes", "-1".to_string()));
        }

        let payload = self.get_json(DATACENTER_URL, &query).await?;
        parse_report_rows(report.name, &payload)
    }

    /// Statement report rows, newest first
    pub async fn statement(
        &self,
        code: &str,
        kind: StatementKind,
        limit: usize,
    ) -> Result<Vec<ReportRow>> {
        self.report(statement_report(kind), code, limit).await
    }

    /// Main financial indicator rows, newest first
    pub async fn financial_indicators(&self, code: &str) -> Result<Vec<ReportRow>> {
        self.report(INDICATOR_REPORT, code, DEFAULT_PAGE_SIZE).await
    }

    /// Analyst earnings forecast rows
    pub async fn profit_forecast(&self, code: &str) -> Result<Vec<ReportRow>> {
        self.report(FORECAST_REPORT, code, DEFAULT_PAGE_SIZE).await
    }

    /// Published quarterly results rows, newest first
    pub async fn quarterly_report(&self, code: &str) -> Result<Vec<ReportRow>> {
        self.report(QUARTERLY_REPORT, code, DEFAULT_PAGE_SIZE).await
    }
}

/// Text field where `"-"` and empty strings mean absent
fn json_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "-")
        .map(str::to_string)
}

fn field_number(record: &Value, field: &str) -> Option<f64> {
    record.get(field).and_then(json_number)
}

/// Parse the `stock/get` payload
pub fn parse_detail(payload: &Value) -> Result<AShareProfile> {
    let data = payload
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| StockError::upstream(PROVIDER, "stock detail has no data"))?;

    Ok(AShareProfile {
        name: json_text(data.get("f58")),
        market_cap: field_number(data, "f116"),
        pe_dynamic: field_number(data, "f162"),
        pb: field_number(data, "f167"),
        industry: json_text(data.get("f127")),
    })
}

/// Parse the `ulist.np/get` payload, picking the row for `code`
pub fn parse_spot(code: &str, payload: &Value) -> Result<AShareSpot> {
    let rows: Vec<&Value> = match payload.pointer("/data/diff") {
        Some(Value::Array(rows)) => rows.iter().collect(),
        // Some responses key the rows by position instead of using an array.
        Some(Value::Object(rows)) => rows.values().collect(),
        _ => Vec::new(),
    };

    let row = rows
        .into_iter()
        .find(|row| json_text(row.get("f12")).as_deref() == Some(code))
        .ok_or_else(|| StockError::upstream(PROVIDER, format!("no spot quote for {code}")))?;

    Ok(AShareSpot {
        code: code.to_string(),
        name: json_text(row.get("f14")),
        price: field_number(row, "f2"),
        change_percent: field_number(row, "f3"),
        pe_dynamic: field_number(row, "f9"),
        pb: field_number(row, "f23"),
    })
}

/// Parse the kline payload; each kline is `date,open,close,high,low,volume,...`
pub fn parse_klines(code: &str, payload: &Value) -> Result<Vec<AShareKline>> {
    let lines = payload
        .pointer("/data/klines")
        .and_then(Value::as_array)
        .ok_or_else(|| StockError::upstream(PROVIDER, format!("no klines for {code}")))?;

    let klines = lines
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|line| {
            let kline = parse_kline_line(line);
            if kline.is_none() {
                warn!(symbol = code, line, "Skipping malformed kline");
            }
            kline
        })
        .collect();

    Ok(klines)
}

fn parse_kline_line(line: &str) -> Option<AShareKline> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 6 {
        return None;
    }
    let number = |i: usize| fields[i].trim().parse::<f64>().ok();

    Some(AShareKline {
        date: fields[0].trim().to_string(),
        open: number(1)?,
        close: number(2)?,
        high: number(3)?,
        low: number(4)?,
        volume: number(5)?,
    })
}

/// Parse a data-center payload into rows
pub fn parse_report_rows(report: &str, payload: &Value) -> Result<Vec<ReportRow>> {
    let rows = payload
        .pointer("/result/data")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no data");
            StockError::upstream(PROVIDER, format!("{report}: {message}"))
        })?;

    Ok(rows.iter().filter_map(|row| row.as_object().cloned()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secid_prefix() {
        assert_eq!(secid("600519"), "1.600519");
        assert_eq!(secid("900901"), "1.900901");
        assert_eq!(secid("000001"), "0.000001");
        assert_eq!(secid("300750"), "0.300750");
        assert_eq!(secid("830799"), "0.830799");
    }

    #[test]
    fn test_parse_detail() {
        let payload = json!({
            "rc": 0,
            "data": {
                "f57": "600519",
                "f58": "贵州茅台",
                "f116": 1.9e12,
                "f162": 28.31,
                "f167": "-",
                "f127": "酿酒行业"
            }
        });
        let profile = parse_detail(&payload).unwrap();
        assert_eq!(profile.name.as_deref(), Some("贵州茅台"));
        assert_eq!(profile.market_cap, Some(1.9e12));
        assert_eq!(profile.pe_dynamic, Some(28.31));
        assert_eq!(profile.pb, None);
        assert_eq!(profile.industry.as_deref(), Some("酿酒行业"));

        assert!(parse_detail(&json!({"rc": 0, "data": null})).is_err());
    }

    #[test]
    fn test_parse_spot_picks_matching_row() {
        let payload = json!({
            "data": {
                "total": 2,
                "diff": [
                    {"f2": 10.0, "f3": 0.5, "f12": "000002", "f14": "Other", "f9": 5.0, "f23": 0.8},
                    {"f2": 11.2, "f3": -1.3, "f12": "000001", "f14": "Ping An Bank", "f9": "-", "f23": 0.6}
                ]
            }
        });
        let spot = parse_spot("000001", &payload).unwrap();
        assert_eq!(spot.price, Some(11.2));
        assert_eq!(spot.change_percent, Some(-1.3));
        assert_eq!(spot.pe_dynamic, None);
        assert_eq!(spot.pb, Some(0.6));

        let keyed = json!({"data": {"diff": {"0": {"f2": 3.0, "f12": "600000"}}}});
        assert_eq!(parse_spot("600000", &keyed).unwrap().price, Some(3.0));

        assert!(parse_spot("600519", &payload).is_err());
    }

    #[test]
    fn test_parse_klines_skips_malformed_lines() {
        let payload = json!({
            "data": {
                "code": "000001",
                "klines": [
                    "2024-06-13,10.00,10.50,10.80,9.90,123456,1.3e8,9.1,5.0,0.5,0.64",
                    "2024-06-14,10.50,-,10.90,10.20,1000",
                    "broken"
                ]
            }
        });
        let klines = parse_klines("000001", &payload).unwrap();
        assert_eq!(klines.len(), 1);
        let k = &klines[0];
        assert_eq!(k.date, "2024-06-13");
        assert_eq!(k.open, 10.0);
        assert_eq!(k.close, 10.5);
        assert_eq!(k.high, 10.8);
        assert_eq!(k.low, 9.9);
        assert_eq!(k.volume, 123_456.0);

        assert!(parse_klines("000001", &json!({"data": null})).is_err());
    }

    #[test]
    fn test_parse_report_rows() {
        let payload = json!({
            "success": true,
            "result": {"data": [{"REPORT_DATE": "2024-03-31 00:00:00", "TOTAL_ASSETS": 1.0}]}
        });
        let rows = parse_report_rows(BALANCE_REPORT.name, &payload).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["TOTAL_ASSETS"], json!(1.0));

        let empty = json!({"success": false, "message": "返回数据为空", "result": null});
        let err = parse_report_rows(BALANCE_REPORT.name, &empty).unwrap_err();
        assert!(err.to_string().contains("RPT_DMSK_FN_BALANCE"));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_klines() {
        let client = EastmoneyClient::new(&StockConfig::default()).unwrap();
        let end = chrono::Local::now().date_naive();
        let start = end - chrono::Duration::days(30);
        let klines = client.klines("600519", start, end).await.unwrap();
        assert!(!klines.is_empty());
    }
}
