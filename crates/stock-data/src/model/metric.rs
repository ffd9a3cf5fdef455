//! Field-level availability marker

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Text used for unavailable values on the wire
pub const UNAVAILABLE: &str = "N/A";

/// A numeric field that is either a finite number or explicitly unavailable
///
/// `NaN` and infinities never make it into a `Metric`; they collapse to
/// [`Metric::Unavailable`] at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Metric {
    Value(f64),
    #[default]
    Unavailable,
}

impl Metric {
    /// Wrap a raw number, rejecting non-finite values
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Unavailable
        }
    }

    /// Accept `value` only when it lies in `(lower, upper]`
    pub fn bounded(value: Option<f64>, lower_exclusive: f64, upper_inclusive: f64) -> Self {
        match Self::from(value) {
            Self::Value(v) if v > lower_exclusive && v <= upper_inclusive => Self::Value(v),
            _ => Self::Unavailable,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Round to `decimals` places, keeping unavailability
    pub fn rounded(self, decimals: i32) -> Self {
        let factor = 10_f64.powi(decimals);
        match self {
            Self::Value(v) => Self::new((v * factor).round() / factor),
            Self::Unavailable => Self::Unavailable,
        }
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unavailable, Self::new)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(v)) => Self::new(v),
            Some(Raw::Text(text)) => parse_number(&text).into(),
            None => Self::Unavailable,
        })
    }
}

/// Parse an upstream number, treating placeholders such as `-` or `--` as absent
///
/// Thousands separators and a trailing `%` are tolerated.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_end_matches('%').replace(',', "");
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') || trimmed == UNAVAILABLE {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
