//! Instrument classification
//!
//! Routing is decided purely from the lexical form of the ticker: six ASCII
//! digits are an A-share code, everything else goes to the international
//! provider. Other digit-coded exchanges (e.g. Hong Kong or Tokyo codes that
//! happen to be six digits) are routed domestically as well.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange group shown for domestic instruments
pub const DOMESTIC_EXCHANGE: &str = "Shanghai/Shenzhen Stock Exchange";

const DOMESTIC_CODE_LEN: usize = 6;

/// Upstream market an instrument belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// A-share equities keyed by 6-digit codes
    Domestic,
    /// Equities served by the international provider
    International,
}

impl Market {
    /// Human-readable market label
    pub fn label(self) -> &'static str {
        match self {
            Self::Domestic => "China A-Share",
            Self::International => "US/International",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a ticker into its upstream market
pub fn classify(ticker: &str) -> Market {
    if ticker.len() == DOMESTIC_CODE_LEN && ticker.bytes().all(|b| b.is_ascii_digit()) {
        Market::Domestic
    } else {
        Market::International
    }
}
