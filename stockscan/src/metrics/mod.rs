//! Metric computation.
//!
//! Every metric function is total: edge cases (empty input, zero
//! denominators, missing statement rows) yield [`Metric::Undefined`] instead
//! of an error or a non-finite float. Comparisons against an undefined metric
//! produce [`Truth::Unknown`], which the screen treats as a failed condition.
//!
//! - `risk`: Sortino ratio and annualised CAPM alpha
//! - `fundamentals`: CROCI and year-over-year growth

mod fundamentals;
mod risk;

pub use fundamentals::{croci, yoy_growth};
pub use risk::{annualised_alpha, regression_intercept, sortino_ratio};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Metric
// ============================================================================

/// A computed metric value, or the explicit absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Metric {
    Value(f64),
    #[default]
    Undefined,
}

impl Metric {
    /// Wrap a float. NaN and infinities become `Undefined`.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Value(v) => Self::new(f(v)),
            Self::Undefined => Self::Undefined,
        }
    }

    /// `self > threshold`
    pub fn gt(&self, threshold: f64) -> Truth {
        self.compare(threshold, |v, t| v > t)
    }

    /// `self < threshold`
    pub fn lt(&self, threshold: f64) -> Truth {
        self.compare(threshold, |v, t| v < t)
    }

    fn compare(&self, threshold: f64, op: impl FnOnce(f64, f64) -> bool) -> Truth {
        match self {
            Self::Value(v) if !threshold.is_nan() => Truth::from(op(*v, threshold)),
            _ => Truth::Unknown,
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
        value.map_or(Self::Undefined, Self::new)
    }
}

/// Formats the inner value (honouring width and precision) or `-`.
impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => fmt::Display::fmt(v, f),
            Self::Undefined => f.pad("-"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<f64>::deserialize(deserializer).map(Self::from)
    }
}

/// Scale a per-period value to an annual one (linear, not compounded).
pub fn annualise(value: Metric, periods_per_year: u32) -> Metric {
    value.map(|v| v * periods_per_year as f64)
}

// ============================================================================
// Truth
// ============================================================================

/// Three-valued (Kleene) truth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    /// Only `True` counts as satisfied.
    pub fn is_true(self) -> bool {
        self == Self::True
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
