//! Market data module.
//!
//! Provides the data model consumed by the metric functions, the provider
//! abstraction, the Yahoo Finance adapter, the memoized benchmark series and
//! the ticker universe sources.
//!
//! # Data Sources
//! - **Yahoo Finance** (default): chart, quote summary and fundamentals
//!   timeseries endpoints
//! - **Constituents CSV**: default ticker universe

mod benchmark;
mod cache;
mod provider;
mod rate_limiter;
mod statement;
pub mod universe;
pub mod yahoo;

pub use benchmark::BenchmarkProvider;
pub use cache::{CacheStats, TtlCache};
pub use provider::{DataProvider, ProviderError, UniverseSource};
pub use rate_limiter::{RateLimiter, SharedRateLimiter};
pub use statement::{FinancialStatement, LineItem, StatementKind};
pub use universe::{parse_ticker_list, ConstituentsUniverse, StaticUniverse};
pub use yahoo::YahooAdapter;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request Parameters
// ============================================================================

/// Bar interval for price history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// Interval string in Yahoo chart API format
    pub fn to_api_interval(&self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "1wk",
            Self::Monthly => "1mo",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "D"),
            Self::Weekly => write!(f, "W"),
            Self::Monthly => write!(f, "M"),
        }
    }
}

/// How far back a price history request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lookback {
    pub years: u32,
}

impl Lookback {
    pub fn years(years: u32) -> Self {
        Self { years }
    }

    /// Range string in Yahoo chart API format (e.g., "3y")
    pub fn to_api_range(&self) -> String {
        format!("{}y", self.years)
    }
}

// ============================================================================
// Prices and Returns
// ============================================================================

/// A single closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing price history for one symbol, ordered by date ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    /// Build a history, sorting bars by date and keeping the last bar per date.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.reverse();
        bars.dedup_by_key(|b| b.date);
        bars.reverse();
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Convert to daily fractional returns.
    pub fn returns(&self) -> ReturnSeries {
        ReturnSeries::from_closes(&self.bars)
    }
}

/// One fractional return observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered sequence of (date, fractional return).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    /// Build from (date, return) pairs. Points are sorted by date.
    pub fn new(mut points: Vec<ReturnPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    /// Percentage change between consecutive closes.
    ///
    /// The first bar has no predecessor and yields no return. Returns that are
    /// not finite (a zero or missing previous close) are dropped.
    pub fn from_closes(bars: &[PriceBar]) -> Self {
        let points = bars
            .windows(2)
            .filter_map(|w| {
                let value = w[1].close / w[0].close - 1.0;
                value.is_finite().then_some(ReturnPoint {
                    date: w[1].date,
                    value,
                })
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    /// Return values without dates.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Inner join with another series on date.
    ///
    /// Returns `(self_value, other_value)` pairs for every date present in both.
    pub fn align_with(&self, other: &ReturnSeries) -> Vec<(f64, f64)> {
        let mut aligned = Vec::with_capacity(self.len().min(other.len()));
        let (mut i, mut j) = (0, 0);
        let (a, b) = (&self.points, &other.points);

        while i < a.len() && j < b.len() {
            match a[i].date.cmp(&b[j].date) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    aligned.push((a[i].value, b[j].value));
                    i += 1;
                    j += 1;
                }
            }
        }

        aligned
    }
}

// ============================================================================
// Snapshot Info
// ============================================================================

/// Point-in-time valuation snapshot for a ticker.
///
/// Every field is optional; a provider that does not report a value leaves it
/// as `None` rather than substituting a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// Trailing twelve-month PE
    pub trailing_pe: Option<f64>,
    /// Enterprise value / EBITDA
    pub ev_to_ebitda: Option<f64>,
    /// Market capitalisation
    pub market_cap: Option<f64>,
    /// Short display name
    pub short_name: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar { date: d(day), close }
    }

    #[test]
    fn test_returns_drop_first_entry() {
        let history = PriceHistory::new("AAA", vec![bar(2, 100.0), bar(3, 110.0), bar(4, 99.0)]);
        let returns = history.returns();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.points()[0].date, d(3));
        assert!((returns.points()[0].value - 0.10).abs() < 1e-12);
        assert!((returns.points()[1].value + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_returns_skip_zero_close() {
        let returns = ReturnSeries::from_closes(&[bar(2, 0.0), bar(3, 10.0), bar(4, 11.0)]);
        assert_eq!(returns.len(), 1);
        assert_eq!(returns.points()[0].date, d(4));
    }

    #[test]
    fn test_history_sorts_and_dedups() {
        let history = PriceHistory::new("AAA", vec![bar(4, 3.0), bar(2, 1.0), bar(3, 2.0), bar(3, 2.5)]);
        let dates: Vec<_> = history.bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![d(2), d(3), d(4)]);
        assert_eq!(history.bars[1].close, 2.5);
    }

    #[test]
    fn test_align_inner_join() {
        let a = ReturnSeries::new(vec![
            ReturnPoint { date: d(2), value: 0.1 },
            ReturnPoint { date: d(3), value: 0.2 },
            ReturnPoint { date: d(5), value: 0.3 },
        ]);
        let b = ReturnSeries::new(vec![
            ReturnPoint { date: d(3), value: -0.2 },
            ReturnPoint { date: d(4), value: -0.4 },
            ReturnPoint { date: d(5), value: -0.3 },
        ]);

        assert_eq!(a.align_with(&b), vec![(0.2, -0.2), (0.3, -0.3)]);
    }

    #[test]
    fn test_api_strings() {
        assert_eq!(Lookback::years(3).to_api_range(), "3y");
        assert_eq!(Interval::Daily.to_api_interval(), "1d");
        assert_eq!(Interval::Weekly.to_api_interval(), "1wk");
    }
}
