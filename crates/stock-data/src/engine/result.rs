//! Analysis result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Output of one analysis pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    pub pass: String,
    pub content: String,
    pub data: HashMap<String, serde_json::Value>,
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PassReport {
    pub fn new(pass: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            pass: pass.into(),
            content: content.into(),
            data: HashMap::new(),
            confidence: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Buy,
    Hold,
    Sell,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
        };
        f.write_str(label)
    }
}

/// Final recommendation synthesized from the pass reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub rating: Rating,
    pub confidence: Option<f64>,
    pub summary: String,
    /// Passes that contributed a report
    pub passes: Vec<String>,
    /// Passes that failed, with their error
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Recommendation {
    pub fn new(symbol: impl Into<String>, rating: Rating, summary: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            rating,
            confidence: None,
            summary: summary.into(),
            passes: Vec::new(),
            warnings: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Confidence in `[0, 1]`; out-of-range input is clamped
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
