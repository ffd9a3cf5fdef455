//! Baidu stock-service valuation history client

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{http_client, request_error};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::gateway::{ValuationIndicator, ValuationPoint, json_number};

const PROVIDER: &str = "baidu";

const OPENDATA_URL: &str = "https://gushitong.baidu.com/opendata";
const VALUATION_RESOURCE_ID: &str = "51171";
const CHART_WINDOW: &str = "近一年";

const SERIES_POINTER: &str = "/Result/0/DisplayData/resultData/tplData/result/chartInfo/0/body";

fn query_label(indicator: ValuationIndicator) -> &'static str {
    match indicator {
        ValuationIndicator::PeTtm => "市盈率(TTM)",
        ValuationIndicator::Pb => "市净率",
    }
}

/// Client for per-code valuation series
#[derive(Debug, Clone)]
pub struct BaiduValuationClient {
    client: Client,
}

impl BaiduValuationClient {
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config, false)?,
        })
    }

    /// One year of valuation points, oldest first
    pub async fn valuation_history(
        &self,
        code: &str,
        indicator: ValuationIndicator,
    ) -> Result<Vec<ValuationPoint>> {
        let label = query_label(indicator);
        debug!(symbol = code, indicator = label, "Requesting valuation history");

        let query = [
            ("openapi", "1"),
            ("dspName", "iphone"),
            ("tn", "tangram"),
            ("client", "app"),
            ("query", label),
            ("code", code),
            ("word", ""),
            ("resource_id", VALUATION_RESOURCE_ID),
            ("market", "ab"),
            ("tag", label),
            ("chart_select", CHART_WINDOW),
            ("industry_select", ""),
            ("skip_industry", "1"),
            ("finClientType", "pc"),
        ];

        let response = self
            .client
            .get(OPENDATA_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(StockError::upstream(
                PROVIDER,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let payload: Value = response.json().await?;
        parse_valuation(&payload)
    }
}

/// Parse the chart body: a list of `[date, value]` pairs
pub fn parse_valuation(payload: &Value) -> Result<Vec<ValuationPoint>> {
    let body = payload
        .pointer(SERIES_POINTER)
        .and_then(Value::as_array)
        .ok_or_else(|| StockError::upstream(PROVIDER, "valuation chart missing"))?;

    let points = body
        .iter()
        .filter_map(|point| {
            let pair = point.as_array()?;
            let date = pair.first()?.as_str()?.to_string();
            let value = pair.get(1).and_then(json_number);
            Some(ValuationPoint { date, value })
        })
        .collect::<Vec<_>>();

    if points.is_empty() {
        return Err(StockError::upstream(PROVIDER, "valuation chart is empty"));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(body: Value) -> Value {
        json!({
            "ResultCode": "0",
            "Result": [{
                "DisplayData": {
                    "resultData": {
                        "tplData": {
                            "result": {"chartInfo": [{"body": body}]}
                        }
                    }
                }
            }]
        })
    }

    #[test]
    fn test_parse_valuation() {
        let payload = chart(json!([
            ["2024-06-12", "31.02"],
            ["2024-06-13", 30.8],
            ["2024-06-14", "-"]
        ]));
        let points = parse_valuation(&payload).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].value, Some(31.02));
        assert_eq!(points[1].value, Some(30.8));
        assert_eq!(points[2].date, "2024-06-14");
        assert_eq!(points[2].value, None);
    }

    #[test]
    fn test_parse_valuation_rejects_missing_or_empty_chart() {
        assert!(parse_valuation(&json!({"Result": []})).is_err());
        assert!(parse_valuation(&chart(json!([]))).is_err());
    }

    #[test]
    fn test_query_labels() {
        assert_eq!(query_label(ValuationIndicator::PeTtm), "市盈率(TTM)");
        assert_eq!(query_label(ValuationIndicator::Pb), "市净率");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_valuation() {
        let client = BaiduValuationClient::new(&StockConfig::default()).unwrap();
        let points = client
            .valuation_history("600519", ValuationIndicator::PeTtm)
            .await
            .unwrap();
        assert!(!points.is_empty());
    }
}
