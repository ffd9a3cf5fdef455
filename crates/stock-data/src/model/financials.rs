//! Best-effort financial statement bundle

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::Metric;
use crate::market::Market;

/// One reporting period of a statement: line item name to raw upstream value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub period: String,
    pub items: Map<String, Value>,
}

/// A statement as a list of periods, most recent first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    pub periods: Vec<StatementPeriod>,
}

impl StatementTable {
    /// Build a table, dropping everything past the `limit` most recent periods
    pub fn most_recent(mut periods: Vec<StatementPeriod>, limit: usize) -> Self {
        periods.truncate(limit);
        Self { periods }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Look up one line item in the most recent period
    pub fn latest_item(&self, item: &str) -> Option<&Value> {
        self.periods.first().and_then(|p| p.items.get(item))
    }
}

/// Named ratios taken from the most recent report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    pub period: Option<String>,
    pub values: BTreeMap<String, Metric>,
}

impl FinancialRatios {
    pub fn get(&self, name: &str) -> Metric {
        self.values.get(name).copied().unwrap_or_default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Metric>) {
        self.values.insert(name.into(), value.into());
    }
}

/// Statements, ratios and a quarterly excerpt for one ticker
///
/// Each part is fetched independently; `None` means that part failed or
/// the upstream had nothing for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialBundle {
    pub symbol: String,
    pub market: Market,
    pub balance_sheet: Option<StatementTable>,
    pub income_statement: Option<StatementTable>,
    pub cash_flow: Option<StatementTable>,
    pub ratios: Option<FinancialRatios>,
    pub quarterly: Option<StatementTable>,
}

impl FinancialBundle {
    pub fn empty(symbol: impl Into<String>, market: Market) -> Self {
        Self {
            symbol: symbol.into(),
            market,
            balance_sheet: None,
            income_statement: None,
            cash_flow: None,
            ratios: None,
            quarterly: None,
        }
    }

    /// Number of sub-documents that were populated
    pub fn available_parts(&self) -> usize {
        [
            self.balance_sheet.is_some(),
            self.income_statement.is_some(),
            self.cash_flow.is_some(),
            self.ratios.is_some(),
            self.quarterly.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}
