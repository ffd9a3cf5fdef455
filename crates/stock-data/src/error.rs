//! Error types for market data operations

use thiserror::Error;

/// Call-level failures for market data operations
///
/// Field-level gaps are not errors: they surface as
/// [`Metric::Unavailable`](crate::model::Metric) or as `None` sub-documents.
#[derive(Debug, Error)]
pub enum StockError {
    /// An upstream provider answered, but not with usable data
    #[error("{provider} error: {message}")]
    Upstream {
        provider: String,
        message: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An upstream call exceeded its time budget
    #[error("Request to {provider} timed out")]
    Timeout {
        provider: String,
    },

    /// Rate limit exceeded for a provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// No historical series could be obtained for the symbol
    #[error("unable to fetch historical data for {symbol}: {reason}")]
    HistoryUnavailable {
        symbol: String,
        reason: String,
    },

    /// The series has no bars to read from
    #[error("no bars available")]
    EmptySeries,

    /// Technical indicator calculation error
    #[error("failed to compute indicators: {0}")]
    IndicatorError(String),

    /// An analysis pass or the synthesis step failed
    #[error("Analysis error: {0}")]
    AnalysisError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl StockError {
    /// Build an [`StockError::Upstream`] error
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Build a [`StockError::HistoryUnavailable`] error
    pub fn history_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HistoryUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Convert anyhow::Error to StockError
impl From<anyhow::Error> for StockError {
    fn from(err: anyhow::Error) -> Self {
        StockError::Other(err.to_string())
    }
}
