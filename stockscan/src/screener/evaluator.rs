//! Per-ticker evaluation.
//!
//! Fetches one ticker's prices, snapshot and statements, computes the metric
//! set and applies the threshold predicate. Every failure along the way
//! becomes a [`SkipReason`]; nothing escapes as an error to the scan.

use std::sync::Arc;
use stockscan_common::config::ThresholdConfig;
use thiserror::Error;

use crate::data::{DataProvider, Interval, LineItem, ProviderError, ReturnSeries};
use crate::metrics::{self, Metric, Truth};

use super::config::ScreenerConfig;
use super::record::{MetricSet, ScanRecord};

/// Why a ticker produced no record.
#[derive(Debug, Clone, Error)]
pub enum SkipReason {
    #[error("insufficient history: {observations} returns, {required} required")]
    InsufficientHistory { observations: usize, required: usize },

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("evaluation panicked: {0}")]
    Panicked(String),
}

impl SkipReason {
    /// Whether the skip is routine for a broad universe and only worth a
    /// debug line: short history, or a permanent provider answer such as an
    /// unlisted symbol. Transient provider failures, timeouts and panics are
    /// not.
    pub fn is_expected(&self) -> bool {
        match self {
            Self::InsufficientHistory { .. } => true,
            Self::Provider(e) => !e.is_recoverable(),
            Self::TimedOut(_) | Self::Panicked(_) => false,
        }
    }
}

/// Evaluate the composite screen.
///
/// ```text
/// (PE < max_pe OR EV/EBITDA < max_ev_ebitda)
///   AND rev_growth > min AND eps_growth > min
///   AND sortino > min AND alpha > min AND croci > min
/// ```
///
/// Undefined metrics compare as `Unknown`. The valuation leg is a Kleene
/// OR, so one defined passing leg satisfies it even if the other is
/// undefined.
pub fn screen(metrics: &MetricSet, thresholds: &ThresholdConfig) -> Truth {
    let valuation = metrics
        .pe
        .lt(thresholds.max_pe)
        .or(metrics.ev_to_ebitda.lt(thresholds.max_ev_ebitda));

    valuation
        .and(metrics.revenue_growth_pct.gt(thresholds.min_revenue_growth_pct))
        .and(metrics.eps_growth_pct.gt(thresholds.min_eps_growth_pct))
        .and(metrics.sortino.gt(thresholds.min_sortino))
        .and(metrics.alpha.gt(thresholds.min_alpha))
        .and(metrics.croci_pct.gt(thresholds.min_croci_pct))
}

/// Whether the metric set passes. Unknown counts as a failure.
pub fn passes(metrics: &MetricSet, thresholds: &ThresholdConfig) -> bool {
    screen(metrics, thresholds).is_true()
}

/// Evaluates single tickers against a shared benchmark.
pub struct TickerEvaluator<P: DataProvider> {
    provider: Arc<P>,
    config: ScreenerConfig,
}

impl<P: DataProvider> TickerEvaluator<P> {
    pub fn new(provider: Arc<P>, config: ScreenerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Produce a record for `ticker`, or the reason it has none.
    pub async fn evaluate(
        &self,
        ticker: &str,
        benchmark: &ReturnSeries,
    ) -> Result<ScanRecord, SkipReason> {
        let history = self
            .provider
            .get_price_history(ticker, self.config.lookback, Interval::Daily)
            .await?;

        let returns = history.returns();
        if returns.len() < self.config.min_observations {
            return Err(SkipReason::InsufficientHistory {
                observations: returns.len(),
                required: self.config.min_observations,
            });
        }

        let (info, income, cash_flow, balance_sheet) = tokio::try_join!(
            self.provider.get_snapshot_info(ticker),
            self.provider.get_income_statement(ticker),
            self.provider.get_cash_flow(ticker),
            self.provider.get_balance_sheet(ticker),
        )?;

        let values: Vec<f64> = returns.values().collect();
        let metrics = MetricSet {
            pe: Metric::from(info.trailing_pe),
            ev_to_ebitda: Metric::from(info.ev_to_ebitda),
            revenue_growth_pct: metrics::yoy_growth(&income, LineItem::TotalRevenue),
            eps_growth_pct: metrics::yoy_growth(&income, LineItem::DilutedEps),
            sortino: metrics::sortino_ratio(&values, self.config.minimum_acceptable_return),
            alpha: metrics::annualised_alpha(
                &returns,
                benchmark,
                self.config.min_alpha_overlap,
                self.config.periods_per_year,
            ),
            croci_pct: metrics::croci(&cash_flow, &balance_sheet),
        };

        let passed = passes(&metrics, &self.config.thresholds);
        Ok(ScanRecord::new(ticker, metrics, passed))
    }
}
