//! Screener configuration.
//!
//! Runtime view of the scanner settings: thresholds plus the window,
//! concurrency and timeout knobs, with durations already resolved.

use std::time::Duration;
use stockscan_common::config::{Config, ScannerConfig, ThresholdConfig};

use crate::data::Lookback;

/// Settings for one scan.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Pass/fail cutoffs
    pub thresholds: ThresholdConfig,
    /// Reference index for alpha
    pub benchmark_symbol: String,
    /// Price history window for tickers and benchmark
    pub lookback: Lookback,
    /// Minimum daily returns for a ticker to be evaluated
    pub min_observations: usize,
    /// Minimum common dates for the alpha regression
    pub min_alpha_overlap: usize,
    /// Periods per year used to annualise alpha
    pub periods_per_year: u32,
    /// Sortino minimum acceptable return (per period)
    pub minimum_acceptable_return: f64,
    /// Concurrent ticker evaluations
    pub concurrency: usize,
    /// Upper bound on one ticker's evaluation
    pub ticker_timeout: Duration,
    /// How long a fetched benchmark series is reused
    pub benchmark_ttl: Duration,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self::from_parts(ThresholdConfig::default(), &ScannerConfig::default())
    }
}

impl ScreenerConfig {
    /// Build from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(config.thresholds, &config.scanner)
    }

    fn from_parts(thresholds: ThresholdConfig, scanner: &ScannerConfig) -> Self {
        Self {
            thresholds,
            benchmark_symbol: scanner.benchmark_symbol.clone(),
            lookback: Lookback::years(scanner.lookback_years),
            min_observations: scanner.min_observations,
            min_alpha_overlap: scanner.min_alpha_overlap,
            periods_per_year: scanner.periods_per_year,
            minimum_acceptable_return: 0.0,
            concurrency: scanner.concurrency.max(1),
            ticker_timeout: Duration::from_secs(scanner.ticker_timeout_secs),
            benchmark_ttl: Duration::from_secs(scanner.benchmark_ttl_secs),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_ticker_timeout(mut self, timeout: Duration) -> Self {
        self.ticker_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_scanner_config() {
        let config = ScreenerConfig::default();
        assert_eq!(config.benchmark_symbol, "SPY");
        assert_eq!(config.lookback, Lookback::years(3));
        assert_eq!(config.min_observations, 252);
        assert_eq!(config.min_alpha_overlap, 30);
        assert_eq!(config.periods_per_year, 252);
        assert_eq!(config.minimum_acceptable_return, 0.0);
        assert_eq!(config.ticker_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let mut app = Config::default();
        app.thresholds.max_pe = 25.0;
        app.scanner.concurrency = 0;
        app.scanner.benchmark_symbol = "QQQ".into();

        let config = ScreenerConfig::from_config(&app);
        assert_eq!(config.thresholds.max_pe, 25.0);
        assert_eq!(config.benchmark_symbol, "QQQ");
        assert_eq!(config.concurrency, 1);
    }
}
