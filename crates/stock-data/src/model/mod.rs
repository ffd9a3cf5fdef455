//! Canonical data model shared by both markets

pub mod financials;
pub mod metric;
pub mod quote;
pub mod series;

pub use financials::{FinancialBundle, FinancialRatios, StatementPeriod, StatementTable};
pub use metric::{Metric, UNAVAILABLE, parse_number};
pub use quote::{PB_CEILING, PE_CEILING, QuoteInfo, QuoteInfoBuilder};
pub use series::{Bar, Period, PriceSeries};
