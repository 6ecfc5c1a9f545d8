//! Scan result records and the result set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::metrics::Metric;

/// Column headers of the presented table, in display order.
pub const COLUMNS: [&str; 8] = [
    "Ticker",
    "PE",
    "EV/EBITDA",
    "Rev YoY %",
    "EPS YoY %",
    "Sortino",
    "Alpha",
    "CROCI %",
];

// ============================================================================
// Metric Set
// ============================================================================

/// The seven screened metrics for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSet {
    /// Trailing PE
    pub pe: Metric,
    /// Enterprise value / EBITDA
    pub ev_to_ebitda: Metric,
    /// Revenue growth (%)
    pub revenue_growth_pct: Metric,
    /// Diluted EPS growth (%)
    pub eps_growth_pct: Metric,
    /// Sortino ratio of daily returns
    pub sortino: Metric,
    /// Annualised CAPM alpha
    pub alpha: Metric,
    /// Cash return on invested capital (%)
    pub croci_pct: Metric,
}

impl MetricSet {
    /// Values in [`COLUMNS`] order, ticker excluded.
    pub fn cells(&self) -> [Metric; 7] {
        [
            self.pe,
            self.ev_to_ebitda,
            self.revenue_growth_pct,
            self.eps_growth_pct,
            self.sortino,
            self.alpha,
            self.croci_pct,
        ]
    }
}

// ============================================================================
// Scan Record
// ============================================================================

/// Outcome of one successfully evaluated ticker. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    ticker: String,
    #[serde(flatten)]
    metrics: MetricSet,
    passed: bool,
}

impl ScanRecord {
    pub fn new(ticker: impl Into<String>, metrics: MetricSet, passed: bool) -> Self {
        Self {
            ticker: ticker.into(),
            metrics,
            passed,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    pub fn alpha(&self) -> Metric {
        self.metrics.alpha
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Presented view without the pass flag.
    pub fn to_row(&self) -> PassingRow {
        PassingRow {
            ticker: self.ticker.clone(),
            metrics: self.metrics,
        }
    }
}

/// A record as presented and exported: ticker and metrics, no pass flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassingRow {
    pub ticker: String,
    #[serde(flatten)]
    pub metrics: MetricSet,
}

/// Descending by alpha; undefined alpha sorts last.
fn alpha_descending(a: Metric, b: Metric) -> Ordering {
    match (a.value(), b.value()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ============================================================================
// Scan Result
// ============================================================================

/// Everything one scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Scan id (also the log correlation id)
    pub scan_id: String,
    /// Evaluated records in submission order
    pub records: Vec<ScanRecord>,
    /// Tickers submitted
    pub total_submitted: usize,
    /// Tickers that produced no record (short history, fetch failure, timeout)
    pub skipped: usize,
    /// Tickers never started because the scan was cancelled
    pub not_started: usize,
    /// Whether the scan was cancelled before all tickers ran
    pub cancelled: bool,
    /// Threshold summary the scan ran with
    pub thresholds: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl ScanResult {
    /// Passing rows, sorted by alpha descending.
    ///
    /// The sort is stable, so ties keep submission order.
    pub fn passing(&self) -> Vec<PassingRow> {
        let mut rows: Vec<&ScanRecord> = self.records.iter().filter(|r| r.passed()).collect();
        rows.sort_by(|a, b| alpha_descending(a.alpha(), b.alpha()));
        rows.into_iter().map(ScanRecord::to_row).collect()
    }

    pub fn pass_count(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    /// e.g. "3 of 500 tickers passed"
    pub fn summary(&self) -> String {
        format!("{} of {} tickers passed", self.pass_count(), self.total_submitted)
    }
}
