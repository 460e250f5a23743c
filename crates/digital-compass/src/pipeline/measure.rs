use serde::{Serialize, Serializer};
use serde_json::Value;

/// Numeric cell from a score table.
///
/// `Zero` is kept apart from `Missing` so that a country scoring exactly zero
/// is never rendered as "no data".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Measure {
    #[default]
    Missing,
    Zero,
    Value(f64),
}

impl Measure {
    /// Parses a raw cell. Blank, unparsable and non-finite cells are `Missing`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(value) => Self::from_f64(value),
            Err(_) => Self::Missing,
        }
    }

    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            Self::Missing
        } else if value == 0.0 {
            Self::Zero
        } else {
            Self::Value(value)
        }
    }

    pub fn raw(self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Zero => Some(0.0),
            Self::Value(value) => Some(value),
        }
    }

    /// Rounds to `decimals` places; zero stays zero and missing stays `None`.
    pub fn rounded(self, decimals: u32) -> Option<f64> {
        self.raw().map(|value| round_to(value, decimals))
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Precomputed ordinal rank. Zero and blank cells never become a `Rank`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rank(f64);

impl Rank {
    pub fn parse(raw: &str) -> Option<Self> {
        match Measure::parse(raw) {
            Measure::Value(value) => Some(Self(value)),
            Measure::Missing | Measure::Zero => None,
        }
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if is_integral(self.0) {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

/// JSON number that prints integral values without a trailing `.0`.
pub(crate) fn json_number(value: f64) -> Value {
    if is_integral(value) {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < i64::MAX as f64
}
