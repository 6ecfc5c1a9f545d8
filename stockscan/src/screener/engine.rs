//! Scan orchestrator.
//!
//! Fetches the benchmark once, evaluates tickers with bounded parallelism,
//! and collects the records into a [`ScanResult`]. Per-ticker failures are
//! contained here; only a benchmark failure or an empty ticker list fails the
//! scan.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use stockscan_common::logging::generate_scan_id;
use stockscan_common::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data::{BenchmarkProvider, DataProvider, ReturnSeries};

use super::config::ScreenerConfig;
use super::evaluator::{SkipReason, TickerEvaluator};
use super::record::{ScanRecord, ScanResult};

/// What happened to one submitted ticker.
enum Outcome {
    Evaluated(ScanRecord),
    Skipped,
    NotStarted,
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// The scan orchestrator.
pub struct ScanEngine<P: DataProvider> {
    benchmark: Arc<BenchmarkProvider<P>>,
    evaluator: TickerEvaluator<P>,
}

impl<P: DataProvider> ScanEngine<P> {
    /// Create an engine with its own benchmark cache.
    pub fn new(provider: Arc<P>, config: ScreenerConfig) -> Self {
        let benchmark = Arc::new(BenchmarkProvider::new(
            Arc::clone(&provider),
            config.benchmark_symbol.clone(),
            config.lookback,
            config.benchmark_ttl,
        ));
        Self::with_benchmark(provider, benchmark, config)
    }

    /// Create an engine sharing an existing benchmark cache.
    pub fn with_benchmark(
        provider: Arc<P>,
        benchmark: Arc<BenchmarkProvider<P>>,
        config: ScreenerConfig,
    ) -> Self {
        Self {
            benchmark,
            evaluator: TickerEvaluator::new(provider, config),
        }
    }

    pub fn config(&self) -> &ScreenerConfig {
        self.evaluator.config()
    }

    /// Scan `tickers` to completion.
    pub async fn run(&self, tickers: &[String]) -> Result<ScanResult> {
        self.run_with_cancel(tickers, &CancellationToken::new()).await
    }

    /// Scan `tickers`, stopping early once `cancel` fires.
    ///
    /// Cancellation is checked before each ticker starts; evaluations already
    /// in flight run to completion (bounded by the per-ticker timeout). The
    /// partial result is returned with `cancelled` set.
    pub async fn run_with_cancel(
        &self,
        tickers: &[String],
        cancel: &CancellationToken,
    ) -> Result<ScanResult> {
        if tickers.is_empty() {
            return Err(Error::InvalidInput("no tickers to scan".into()).into());
        }

        let started_at = Utc::now();
        let scan_id = generate_scan_id();
        let config = self.config();

        info!(
            scan_id = %scan_id,
            tickers = tickers.len(),
            concurrency = config.concurrency,
            benchmark = %self.benchmark.symbol(),
            thresholds = %config.thresholds.summary(),
            "Starting scan"
        );

        let benchmark = self
            .benchmark
            .returns()
            .await
            .with_context(|| format!("Failed to fetch benchmark {}", self.benchmark.symbol()))?;

        let mut outcomes: Vec<(usize, Outcome)> = stream::iter(tickers.iter().enumerate())
            .map(|(index, ticker)| {
                let benchmark = Arc::clone(&benchmark);
                let scan_id = scan_id.as_str();
                async move {
                    if cancel.is_cancelled() {
                        return (index, Outcome::NotStarted);
                    }
                    (index, self.evaluate_one(scan_id, ticker, &benchmark).await)
                }
            })
            .buffer_unordered(config.concurrency)
            .collect()
            .await;

        // Completion order is arbitrary; restore submission order.
        outcomes.sort_by_key(|(index, _)| *index);

        let mut records = Vec::new();
        let (mut skipped, mut not_started) = (0, 0);
        for (_, outcome) in outcomes {
            match outcome {
                Outcome::Evaluated(record) => records.push(record),
                Outcome::Skipped => skipped += 1,
                Outcome::NotStarted => not_started += 1,
            }
        }

        let completed_at = Utc::now();
        let duration_secs = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let result = ScanResult {
            scan_id,
            records,
            total_submitted: tickers.len(),
            skipped,
            not_started,
            cancelled: not_started > 0,
            thresholds: config.thresholds.summary(),
            started_at,
            completed_at,
            duration_secs,
        };

        if result.records.is_empty() && result.skipped > 0 {
            warn!(
                scan_id = %result.scan_id,
                skipped = result.skipped,
                "Every started ticker was skipped; check provider access"
            );
        }

        if result.cancelled {
            warn!(
                scan_id = %result.scan_id,
                not_started = result.not_started,
                "Scan cancelled"
            );
        }

        info!(
            scan_id = %result.scan_id,
            evaluated = result.records.len(),
            passed = result.pass_count(),
            skipped = result.skipped,
            duration = format!("{:.1}s", duration_secs),
            "{}",
            result.summary()
        );

        Ok(result)
    }

    async fn evaluate_one(&self, scan_id: &str, ticker: &str, benchmark: &ReturnSeries) -> Outcome {
        let timeout = self.config().ticker_timeout;
        let evaluation = AssertUnwindSafe(self.evaluator.evaluate(ticker, benchmark)).catch_unwind();

        let outcome = match tokio::time::timeout(timeout, evaluation).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(SkipReason::Panicked(panic_message(panic.as_ref()))),
            Err(_) => Err(SkipReason::TimedOut(timeout)),
        };

        match outcome {
            Ok(record) => {
                debug!(scan_id, ticker, passed = record.passed(), "Ticker evaluated");
                Outcome::Evaluated(record)
            }
            Err(reason) if reason.is_expected() => {
                debug!(scan_id, ticker, reason = %reason, "Ticker skipped");
                Outcome::Skipped
            }
            Err(reason) => {
                warn!(scan_id, ticker, error = %reason, "Ticker skipped");
                Outcome::Skipped
            }
        }
    }
}
