//! A-share fetch path
//!
//! Quote info is assembled from four independent lookups (detail, spot quote
//! or its short-history fallback, P/E valuation, P/B valuation). Each one
//! only forfeits its own fields when it fails.

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use super::source::{
    AShareKline, AShareProfile, AShareSpot, DomesticSource, ReportRow, StatementKind,
    ValuationIndicator, ValuationPoint,
};
use super::{json_number, soft_step};
use crate::error::{Result, StockError};
use crate::market::{DOMESTIC_EXCHANGE, Market};
use crate::model::{
    Bar, FinancialBundle, FinancialRatios, Metric, Period, PriceSeries, QuoteInfo,
    QuoteInfoBuilder, StatementPeriod, StatementTable,
};

/// Statement periods kept per report type
pub const STATEMENT_PERIODS: usize = 8;
/// Rows kept from the quarterly excerpt
pub const QUARTERLY_ROWS: usize = 4;
/// Calendar days fetched when the spot quote is unavailable
const FALLBACK_LOOKBACK_DAYS: i64 = 5;

const KLINE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Ratio name and the indicator column it is read from
const RATIO_FIELDS: [(&str, &str); 12] = [
    ("roe", "ROEJQ"),
    ("roa", "ZZCJLL"),
    ("gross_margin", "XSMLL"),
    ("net_margin", "XSJLL"),
    ("debt_ratio", "ZCFZL"),
    ("current_ratio", "LD"),
    ("quick_ratio", "SD"),
    ("inventory_turnover", "CHZZL"),
    ("receivables_turnover", "YSZKZZL"),
    ("total_asset_turnover", "TOAZZL"),
    ("revenue_yoy_growth", "TOTALOPERATEREVETZ"),
    ("net_profit_yoy_growth", "PARENTNETPROFITTZ"),
];

const PERIOD_COLUMNS: [&str; 4] = ["REPORT_DATE", "REPORT_DATE_NAME", "REPORTDATE", "NOTICE_DATE"];

pub(crate) async fn quote_info(
    source: &dyn DomesticSource,
    code: &str,
    today: NaiveDate,
) -> QuoteInfo {
    let mut builder = QuoteInfoBuilder::new(code, Market::Domestic);
    builder.exchange(Some(DOMESTIC_EXCHANGE));

    if let Some(profile) = soft_step(code, "profile", source.profile(code)).await {
        apply_profile(&mut builder, &profile);
    }

    match soft_step(code, "spot_quote", source.spot_quote(code)).await {
        Some(spot) => apply_spot(&mut builder, &spot),
        None => {
            let start = today - Duration::days(FALLBACK_LOOKBACK_DAYS);
            let recent = source.daily_bars(code, start, today);
            if let Some(klines) = soft_step(code, "recent_closes", recent).await {
                apply_recent_closes(&mut builder, &klines);
            }
        }
    }

    for indicator in [ValuationIndicator::PeTtm, ValuationIndicator::Pb] {
        let populated = match indicator {
            ValuationIndicator::PeTtm => builder.has_pe_ratio(),
            ValuationIndicator::Pb => builder.has_pb_ratio(),
        };
        if populated {
            continue;
        }
        let step = match indicator {
            ValuationIndicator::PeTtm => "valuation_pe",
            ValuationIndicator::Pb => "valuation_pb",
        };
        if let Some(points) = soft_step(code, step, source.valuation(code, indicator)).await {
            apply_valuation(&mut builder, indicator, &points);
        }
    }

    builder.build()
}

/// Detail step: name, market cap, P/E, P/B, industry
pub fn apply_profile(builder: &mut QuoteInfoBuilder, profile: &AShareProfile) {
    builder.name_if_unset(profile.name.as_deref());
    builder.market_cap(profile.market_cap);
    builder.pe_ratio_if_unset(profile.pe_dynamic);
    builder.pb_ratio_if_unset(profile.pb);
    builder.industry(profile.industry.as_deref());
}

/// Spot step: price and change, plus name/P/E/P/B where still missing
pub fn apply_spot(builder: &mut QuoteInfoBuilder, spot: &AShareSpot) {
    builder.current_price(spot.price);
    builder.change_percent(spot.change_percent);
    builder.name_if_unset(spot.name.as_deref());
    builder.pe_ratio_if_unset(spot.pe_dynamic);
    builder.pb_ratio_if_unset(spot.pb);
}

/// Fallback step: price from the last close, change from the last two closes
pub fn apply_recent_closes(builder: &mut QuoteInfoBuilder, klines: &[AShareKline]) {
    let mut ordered: Vec<&AShareKline> = klines.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date));

    let Some(latest) = ordered.last() else {
        return;
    };
    builder.current_price(Some(latest.close));

    if let [.., previous, latest] = ordered.as_slice() {
        let change = (latest.close - previous.close) / previous.close * 100.0;
        builder.change_percent(Metric::new(change).rounded(2).value());
    }
}

/// Valuation step: the most recent point fills P/E or P/B if unset
pub fn apply_valuation(
    builder: &mut QuoteInfoBuilder,
    indicator: ValuationIndicator,
    points: &[ValuationPoint],
) {
    let latest = points.last().and_then(|p| p.value);
    match indicator {
        ValuationIndicator::PeTtm => builder.pe_ratio_if_unset(latest),
        ValuationIndicator::Pb => builder.pb_ratio_if_unset(latest),
    };
}

pub(crate) async fn history(
    source: &dyn DomesticSource,
    code: &str,
    period: Period,
    today: NaiveDate,
) -> Result<PriceSeries> {
    let start = today - Duration::days(period.lookback_days());
    debug!(symbol = code, %start, end = %today, "Fetching A-share daily bars");

    let klines = source
        .daily_bars(code, start, today)
        .await
        .map_err(|e| StockError::history_unavailable(code, e.to_string()))?;

    let series = normalize_klines(code, klines);
    if series.is_empty() {
        return Err(StockError::history_unavailable(code, "no bars returned"));
    }
    Ok(series)
}

/// Map upstream klines into canonical bars, dropping rows with unreadable dates
pub fn normalize_klines(code: &str, klines: Vec<AShareKline>) -> PriceSeries {
    let bars = klines
        .into_iter()
        .filter_map(|k| match NaiveDate::parse_from_str(k.date.trim(), KLINE_DATE_FORMAT) {
            Ok(date) => Some(Bar {
                date,
                open: k.open,
                high: k.high,
                low: k.low,
                close: k.close,
                volume: k.volume,
            }),
            Err(e) => {
                warn!(symbol = code, date = %k.date, error = %e, "Skipping kline with bad date");
                None
            },
        })
        .collect();

    PriceSeries::new(code, bars)
}

pub(crate) async fn financials(source: &dyn DomesticSource, code: &str) -> FinancialBundle {
    let mut bundle = FinancialBundle::empty(code, Market::Domestic);

    for kind in StatementKind::ALL {
        let fetched = source.statement(code, kind, STATEMENT_PERIODS);
        let table = soft_step(code, kind.as_str(), fetched)
            .await
            .map(|rows| report_table(rows, STATEMENT_PERIODS))
            .filter(|table| !table.is_empty());

        match kind {
            StatementKind::BalanceSheet => bundle.balance_sheet = table,
            StatementKind::IncomeStatement => bundle.income_statement = table,
            StatementKind::CashFlow => bundle.cash_flow = table,
        }
    }

    bundle.ratios = soft_step(code, "financial_indicators", source.financial_indicators(code))
        .await
        .and_then(|rows| rows.into_iter().next())
        .map(|row| ratios_from_indicator_row(&row));

    bundle.quarterly = quarterly(source, code).await;
    bundle
}

async fn quarterly(source: &dyn DomesticSource, code: &str) -> Option<StatementTable> {
    match source.profit_forecast(code).await {
        Ok(rows) => {
            return Some(report_table(rows, QUARTERLY_ROWS)).filter(|t| !t.is_empty());
        },
        Err(e) => {
            debug!(symbol = code, error = %e, "Profit forecast unavailable, trying quarterly report");
        },
    }

    soft_step(code, "quarterly_report", source.quarterly_report(code))
        .await
        .map(|rows| report_table(rows, QUARTERLY_ROWS))
        .filter(|t| !t.is_empty())
}

/// Turn newest-first report rows into a statement table
pub fn report_table(rows: Vec<ReportRow>, limit: usize) -> StatementTable {
    let periods = rows
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, items)| StatementPeriod {
            period: period_label(&items).unwrap_or_else(|| format!("#{index}")),
            items,
        })
        .collect();

    StatementTable::most_recent(periods, limit)
}

/// Pick the ratio list out of the most recent indicator row
pub fn ratios_from_indicator_row(row: &ReportRow) -> FinancialRatios {
    let mut ratios = FinancialRatios {
        period: period_label(row),
        ..Default::default()
    };
    for (name, column) in RATIO_FIELDS {
        ratios.insert(name, row.get(column).and_then(json_number));
    }
    ratios
}

fn period_label(row: &ReportRow) -> Option<String> {
    PERIOD_COLUMNS.iter().find_map(|column| {
        row.get(*column)
            .and_then(|v| v.as_str())
            .map(|s| s.split_whitespace().next().unwrap_or(s).to_string())
            .filter(|s| !s.is_empty())
    })
}
