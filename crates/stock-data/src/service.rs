//! Caller-facing facade over the gateway and the indicator engine

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{SnapshotCache, SnapshotKey};
use crate::config::StockConfig;
use crate::error::Result;
use crate::gateway::MarketDataGateway;
use crate::indicators::{EnrichedSeries, LatestIndicators, compute_indicators, latest_snapshot};
use crate::model::{FinancialBundle, Period, PriceSeries, QuoteInfo};

/// Everything a caller shows for one `(ticker, period)`
///
/// `series` and `latest` are absent when no usable history could be
/// loaded; `series_error` then says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub info: QuoteInfo,
    pub period: Period,
    pub series: Option<EnrichedSeries>,
    pub latest: Option<LatestIndicators>,
    pub series_error: Option<String>,
}

impl MarketSnapshot {
    /// Quote info, indicators and latest values are all present
    pub fn is_complete(&self) -> bool {
        self.series.is_some() && self.latest.is_some()
    }
}

/// Market data service
#[derive(Clone)]
pub struct StockDataService {
    gateway: MarketDataGateway,
    cache: Option<SnapshotCache>,
}

impl StockDataService {
    /// Service without snapshot memoization
    pub fn new(gateway: MarketDataGateway) -> Self {
        Self {
            gateway,
            cache: None,
        }
    }

    /// Memoize complete snapshots in `cache`
    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Production upstreams plus a snapshot cache living `cache_ttl`
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let gateway = MarketDataGateway::from_config(config)?;
        Ok(Self::new(gateway).with_cache(SnapshotCache::new(config.cache_ttl)))
    }

    pub fn gateway(&self) -> &MarketDataGateway {
        &self.gateway
    }

    pub async fn get_stock_info(&self, ticker: &str) -> QuoteInfo {
        self.gateway.fetch_quote_info(ticker).await
    }

    pub async fn get_stock_data(&self, ticker: &str, period: Period) -> Result<PriceSeries> {
        self.gateway.fetch_history(ticker, period).await
    }

    pub async fn get_financial_data(&self, ticker: &str) -> FinancialBundle {
        self.gateway.fetch_financials(ticker).await
    }

    /// Enrich a fetched series; an incoming error passes through untouched
    pub fn calculate_technical_indicators(series: Result<PriceSeries>) -> Result<EnrichedSeries> {
        series.and_then(|series| compute_indicators(&series))
    }

    /// Latest row of an enriched series; an incoming error passes through untouched
    pub fn get_latest_indicators(enriched: Result<EnrichedSeries>) -> Result<LatestIndicators> {
        enriched.and_then(|enriched| latest_snapshot(&enriched))
    }

    /// Quote info, enriched history and latest values for one ticker
    ///
    /// A history or indicator failure does not fail the snapshot. Only
    /// complete snapshots are memoized, so a transient upstream failure is
    /// retried on the next call.
    pub async fn load_snapshot(&self, ticker: &str, period: Period) -> MarketSnapshot {
        let Some(cache) = &self.cache else {
            return self.build_snapshot(ticker, period).await;
        };

        let key = SnapshotKey::new(ticker, period);
        cache
            .get_or_fetch(key, || async {
                let snapshot = self.build_snapshot(ticker, period).await;
                if snapshot.is_complete() {
                    Ok(snapshot)
                } else {
                    Err(Box::new(snapshot))
                }
            })
            .await
            .unwrap_or_else(|incomplete| *incomplete)
    }

    async fn build_snapshot(&self, ticker: &str, period: Period) -> MarketSnapshot {
        info!(symbol = ticker, %period, "Loading market snapshot");
        let info = self.gateway.fetch_quote_info(ticker).await;

        let enriched = self
            .gateway
            .fetch_history(ticker, period)
            .await
            .and_then(|series| compute_indicators(&series))
            .and_then(|enriched| latest_snapshot(&enriched).map(|latest| (enriched, latest)));

        match enriched {
            Ok((series, latest)) => MarketSnapshot {
                info,
                period,
                series: Some(series),
                latest: Some(latest),
                series_error: None,
            },
            Err(e) => {
                warn!(symbol = ticker, error = %e, "Snapshot has no usable price history");
                MarketSnapshot {
                    info,
                    period,
                    series: None,
                    latest: None,
                    series_error: Some(e.to_string()),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockError;
    use crate::gateway::source::{AShareKline, TickerBar};
    use crate::gateway::testing::{FakeDomestic, FakeInternational, kline, ticker_bar};
    use crate::model::Metric;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn klines(len: usize) -> Vec<AShareKline> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..len)
            .map(|i| {
                let date = (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string();
                kline(&date, 10.0 + i as f64 * 0.05)
            })
            .collect()
    }

    fn bars(len: usize) -> Vec<TickerBar> {
        (0..len)
            .map(|i| ticker_bar(1_704_103_200 + i as i64 * 86_400, 100.0 + i as f64))
            .collect()
    }

    fn service(domestic: FakeDomestic, international: FakeInternational) -> StockDataService {
        StockDataService::new(MarketDataGateway::new(Arc::new(domestic), Arc::new(international)))
    }

    #[tokio::test]
    async fn test_snapshot_pipeline() {
        let mut domestic = FakeDomestic::healthy();
        domestic.klines = Some(klines(70));
        let service = service(domestic, FakeInternational::failing());

        let snapshot = service.load_snapshot("600519", Period::OneYear).await;
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.info.name, "Kweichow Moutai");
        let series = snapshot.series.as_ref().unwrap();
        let last_close = series.series().last().unwrap().close;
        assert_eq!(snapshot.latest.unwrap().price, Metric::Value(last_close));
    }

    #[tokio::test]
    async fn test_snapshot_without_history() {
        let service = service(FakeDomestic::failing(), FakeInternational::failing());
        let snapshot = service.load_snapshot("AAPL", Period::SixMonths).await;

        assert!(!snapshot.is_complete());
        assert!(snapshot.series.is_none());
        assert_eq!(snapshot.info.name, "StockAAPL");
        assert!(
            snapshot
                .series_error
                .unwrap()
                .contains("unable to fetch historical data")
        );
    }

    #[tokio::test]
    async fn test_complete_snapshots_are_memoized() {
        let domestic = Arc::new(FakeDomestic::failing());
        let mut international = FakeInternational::healthy();
        international.bars = Some(bars(30));
        let international = Arc::new(international);

        let gateway = MarketDataGateway::new(domestic, international.clone());
        let cache = SnapshotCache::new(std::time::Duration::from_secs(60));
        let service = StockDataService::new(gateway).with_cache(cache.clone());

        let first = service.load_snapshot("AAPL", Period::OneYear).await;
        let second = service.load_snapshot("AAPL", Period::OneYear).await;
        assert_eq!(first, second);
        // One quote-history call plus one series call, no second round.
        assert_eq!(international.calls("history"), 2);
        assert_eq!(cache.len().await, 1);

        service.load_snapshot("AAPL", Period::ThreeMonths).await;
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_incomplete_snapshots_are_not_memoized() {
        let international = Arc::new(FakeInternational::failing());
        let gateway = MarketDataGateway::new(Arc::new(FakeDomestic::failing()), international.clone());
        let cache = SnapshotCache::new(std::time::Duration::from_secs(60));
        let service = StockDataService::new(gateway).with_cache(cache.clone());

        service.load_snapshot("AAPL", Period::OneYear).await;
        service.load_snapshot("AAPL", Period::OneYear).await;
        assert_eq!(international.calls("history"), 4);
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_error_markers_propagate_unchanged() {
        let failed: Result<PriceSeries> = Err(StockError::history_unavailable("AAPL", "timeout"));
        let enriched = StockDataService::calculate_technical_indicators(failed);
        let err = StockDataService::get_latest_indicators(enriched).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to fetch historical data for AAPL: timeout"
        );
    }

    #[tokio::test]
    async fn test_facade_round_trip() {
        let mut international = FakeInternational::healthy();
        international.bars = Some(bars(65));
        let service = service(FakeDomestic::failing(), international);

        let series = service.get_stock_data("AAPL", Period::OneYear).await;
        let last_close = series.as_ref().unwrap().last().unwrap().close;
        let enriched = StockDataService::calculate_technical_indicators(series);
        let latest = StockDataService::get_latest_indicators(enriched).unwrap();
        assert_eq!(latest.get("price"), Some(Metric::Value(last_close)));
        assert!(latest.ma60.is_available());

        let bundle = service.get_financial_data("AAPL").await;
        assert!(bundle.ratios.is_some());
    }
}
