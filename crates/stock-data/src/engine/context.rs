//! Inputs handed to every analysis pass

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::{EnrichedSeries, LatestIndicators};
use crate::model::{FinancialBundle, Period, QuoteInfo};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub symbol: String,
    pub period: Period,
    pub info: QuoteInfo,
    pub series: EnrichedSeries,
    pub latest: LatestIndicators,
    pub financials: FinancialBundle,
    pub created_at: DateTime<Utc>,
}

impl AnalysisContext {
    pub fn new(
        info: QuoteInfo,
        period: Period,
        series: EnrichedSeries,
        latest: LatestIndicators,
        financials: FinancialBundle,
    ) -> Self {
        Self {
            symbol: info.symbol.clone(),
            period,
            info,
            series,
            latest,
            financials,
            created_at: Utc::now(),
        }
    }

    /// Display name with the ticker, e.g. `Apple Inc. (AAPL)`
    pub fn title(&self) -> String {
        format!("{} ({})", self.info.name, self.symbol)
    }
}
