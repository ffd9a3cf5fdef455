//! International fetch path

use chrono::DateTime;
use tracing::warn;

use super::soft_step;
use super::source::{InternationalSource, StatementKind, TickerBar, TickerProfile};
use crate::error::{Result, StockError};
use crate::market::Market;
use crate::model::{
    Bar, FinancialBundle, FinancialRatios, Period, PriceSeries, QuoteInfo, QuoteInfoBuilder,
    StatementTable,
};

/// Statement periods kept per statement
pub const STATEMENT_PERIODS: usize = 4;
/// Range used to derive the current price and day-over-day change
const QUOTE_HISTORY_RANGE: &str = "5d";

pub(crate) async fn quote_info(source: &dyn InternationalSource, symbol: &str) -> QuoteInfo {
    let mut builder = QuoteInfoBuilder::new(symbol, Market::International);

    let recent = source.history(symbol, QUOTE_HISTORY_RANGE);
    if let Some(bars) = soft_step(symbol, "price_history", recent).await {
        apply_price_history(&mut builder, &bars);
    }

    if let Some(profile) = soft_step(symbol, "profile", source.profile(symbol)).await {
        apply_profile(&mut builder, &profile);
    }

    builder.build()
}

/// Price from the last close, change from the last two closes
pub fn apply_price_history(builder: &mut QuoteInfoBuilder, bars: &[TickerBar]) {
    let mut ordered: Vec<&TickerBar> = bars.iter().collect();
    ordered.sort_by_key(|bar| bar.timestamp);

    if let Some(latest) = ordered.last() {
        builder.current_price(Some(latest.close));
    }
    if let [.., previous, latest] = ordered.as_slice() {
        builder.change_percent(Some((latest.close - previous.close) / previous.close * 100.0));
    }
}

/// Descriptive fields from the info document
///
/// Price and change only fill gaps the price history left.
pub fn apply_profile(builder: &mut QuoteInfoBuilder, profile: &TickerProfile) {
    builder.name_if_unset(profile.long_name.as_deref());
    builder.name_if_unset(profile.short_name.as_deref());

    if !builder.has_price() {
        builder.current_price(profile.current_price.or(profile.regular_market_price));
    }
    if !builder.has_change_percent() {
        builder.change_percent(profile.regular_market_change_percent.map(|c| c * 100.0));
    }

    builder.market_cap(profile.market_cap);
    if !builder.pe_ratio_if_unset(profile.trailing_pe) {
        builder.pe_ratio_if_unset(profile.forward_pe);
    }
    builder.pb_ratio_if_unset(profile.price_to_book);
    builder.dividend_yield(profile.dividend_yield);
    builder.beta(profile.beta);
    builder.week_52_range(profile.fifty_two_week_high, profile.fifty_two_week_low);
    builder.sector(profile.sector.as_deref());
    builder.industry(profile.industry.as_deref());
    builder.exchange(profile.exchange.as_deref());
}

pub(crate) async fn history(
    source: &dyn InternationalSource,
    symbol: &str,
    period: Period,
) -> Result<PriceSeries> {
    let bars = source
        .history(symbol, period.as_range())
        .await
        .map_err(|e| StockError::history_unavailable(symbol, e.to_string()))?;

    let series = normalize_bars(symbol, bars);
    if series.is_empty() {
        return Err(StockError::history_unavailable(symbol, "no bars returned"));
    }
    Ok(series)
}

/// Map provider bars onto canonical bars keyed by UTC session date
pub fn normalize_bars(symbol: &str, bars: Vec<TickerBar>) -> PriceSeries {
    let bars = bars
        .into_iter()
        .filter_map(|bar| {
            let Some(timestamp) = DateTime::from_timestamp(bar.timestamp, 0) else {
                warn!(symbol, timestamp = bar.timestamp, "Skipping bar with bad timestamp");
                return None;
            };
            Some(Bar {
                date: timestamp.date_naive(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume as f64,
            })
        })
        .collect();

    PriceSeries::new(symbol, bars)
}

pub(crate) async fn financials(source: &dyn InternationalSource, symbol: &str) -> FinancialBundle {
    let mut bundle = FinancialBundle::empty(symbol, Market::International);

    for kind in StatementKind::ALL {
        let table = soft_step(symbol, kind.as_str(), source.statement(symbol, kind))
            .await
            .map(|periods| StatementTable::most_recent(periods, STATEMENT_PERIODS))
            .filter(|table| !table.is_empty());

        match kind {
            StatementKind::BalanceSheet => bundle.balance_sheet = table,
            StatementKind::IncomeStatement => bundle.income_statement = table,
            StatementKind::CashFlow => bundle.cash_flow = table,
        }
    }

    bundle.ratios = soft_step(symbol, "profile", source.profile(symbol))
        .await
        .map(|profile| ratios_from_profile(&profile));

    bundle
}

/// Ratio list read straight from the info document
pub fn ratios_from_profile(profile: &TickerProfile) -> FinancialRatios {
    let mut ratios = FinancialRatios::default();
    let fields = [
        ("roe", profile.return_on_equity),
        ("roa", profile.return_on_assets),
        ("gross_margin", profile.gross_margins),
        ("operating_margin", profile.operating_margins),
        ("net_margin", profile.profit_margins),
        ("debt_to_equity", profile.debt_to_equity),
        ("current_ratio", profile.current_ratio),
        ("quick_ratio", profile.quick_ratio),
        ("eps", profile.trailing_eps),
        ("book_value_per_share", profile.book_value),
        ("dividend_yield", profile.dividend_yield),
        ("payout_ratio", profile.payout_ratio),
        ("revenue_growth", profile.revenue_growth),
        ("earnings_growth", profile.earnings_growth),
    ];
    for (name, value) in fields {
        ratios.insert(name, value);
    }
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{FakeInternational, ticker_bar};
    use crate::model::Metric;

    #[tokio::test]
    async fn test_quote_info_full() {
        let source = FakeInternational::healthy();
        let info = quote_info(&source, "AAPL").await;

        assert_eq!(info.name, "Apple Inc.");
        assert_eq!(info.current_price, Metric::Value(110.0));
        let change = info.change_percent.value().unwrap();
        assert!((change - 10.0).abs() < 1e-9);
        assert_eq!(info.pe_ratio, Metric::Value(30.0));
        assert_eq!(info.pb_ratio, Metric::Value(45.0));
        assert_eq!(info.beta, Metric::Value(1.2));
        assert_eq!(info.week_52_high, Metric::Value(200.0));
        assert_eq!(info.sector.as_deref(), Some("Technology"));
        assert_eq!(info.exchange.as_deref(), Some("NMS"));
        assert_eq!(source.last_range().as_deref(), Some(QUOTE_HISTORY_RANGE));
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_price_data() {
        let mut source = FakeInternational::healthy();
        source.profile = None;
        let info = quote_info(&source, "AAPL").await;

        assert_eq!(info.name, "StockAAPL");
        assert_eq!(info.current_price, Metric::Value(110.0));
        assert!(info.change_percent.is_available());
        assert_eq!(info.pe_ratio, Metric::Unavailable);
        assert!(info.sector.is_none());
    }

    #[tokio::test]
    async fn test_history_failure_uses_profile_price() {
        let mut source = FakeInternational::healthy();
        source.bars = None;
        let info = quote_info(&source, "AAPL").await;

        assert_eq!(info.current_price, Metric::Value(189.5));
        let change = info.change_percent.value().unwrap();
        assert!((change - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_pe_prefers_trailing_then_forward() {
        let mut profile = FakeInternational::profile();
        profile.trailing_pe = Some(-4.0);
        profile.forward_pe = Some(22.0);
        let mut builder = QuoteInfoBuilder::new("AAPL", Market::International);
        apply_profile(&mut builder, &profile);
        assert_eq!(builder.build().pe_ratio, Metric::Value(22.0));

        profile.trailing_pe = None;
        profile.forward_pe = None;
        let mut builder = QuoteInfoBuilder::new("AAPL", Market::International);
        apply_profile(&mut builder, &profile);
        assert_eq!(builder.build().pe_ratio, Metric::Unavailable);
    }

    #[test]
    fn test_short_name_fallback() {
        let mut profile = FakeInternational::profile();
        profile.long_name = None;
        let mut builder = QuoteInfoBuilder::new("AAPL", Market::International);
        apply_profile(&mut builder, &profile);
        assert_eq!(builder.build().name, "Apple");
    }

    #[tokio::test]
    async fn test_history_passes_period_through() {
        let source = FakeInternational::healthy();
        let series = history(&source, "AAPL", Period::ThreeMonths).await.unwrap();
        assert_eq!(source.last_range().as_deref(), Some("3mo"));
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_history_empty_is_error() {
        let mut source = FakeInternational::healthy();
        source.bars = Some(Vec::new());
        let err = history(&source, "AAPL", Period::OneYear).await.unwrap_err();
        assert!(matches!(err, StockError::HistoryUnavailable { .. }));
    }

    #[test]
    fn test_normalize_bars_orders_by_date() {
        let series = normalize_bars(
            "AAPL",
            vec![ticker_bar(1_718_370_000, 2.0), ticker_bar(1_718_283_600, 1.0)],
        );
        assert_eq!(series.closes(), vec![1.0, 2.0]);
        assert_eq!(series.bars()[0].volume, 1_000.0);
    }

    #[tokio::test]
    async fn test_financials_truncated_to_four_periods() {
        let mut source = FakeInternational::healthy();
        source.fail_statement = Some(StatementKind::IncomeStatement);

        let bundle = financials(&source, "AAPL").await;
        assert_eq!(bundle.balance_sheet.as_ref().unwrap().len(), STATEMENT_PERIODS);
        assert!(bundle.income_statement.is_none());
        assert_eq!(bundle.cash_flow.as_ref().unwrap().len(), STATEMENT_PERIODS);
        assert!(bundle.quarterly.is_none());

        let ratios = bundle.ratios.unwrap();
        assert_eq!(ratios.values.len(), 14);
        assert_eq!(ratios.get("roe"), Metric::Value(1.5));
        assert_eq!(ratios.get("earnings_growth"), Metric::Unavailable);
    }

    #[tokio::test]
    async fn test_financials_profile_failure_keeps_statements() {
        let mut source = FakeInternational::healthy();
        source.profile = None;
        let bundle = financials(&source, "AAPL").await;
        assert!(bundle.ratios.is_none());
        assert!(bundle.balance_sheet.is_some());
    }
}
