//! Configuration management for the scanner.
//!
//! Configuration lives in a single JSON file at `~/.stockscan/config.json`.
//! Every section and field has a default, so a missing file or a partial
//! file is always valid.
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (applied by the binary)
//! 2. Environment variables (STOCKSCAN_* prefix)
//! 3. Explicit config file values
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `STOCKSCAN_LOG_LEVEL` → observability.log_level
//! - `STOCKSCAN_LOG_FORMAT` → observability.log_format
//! - `STOCKSCAN_BENCHMARK` → scanner.benchmark_symbol
//! - `STOCKSCAN_CONCURRENCY` → scanner.concurrency
//! - `STOCKSCAN_TICKER_TIMEOUT_SECS` → scanner.ticker_timeout_secs
//! - `STOCKSCAN_SHEETS_CREDENTIALS` → export.sheets_credentials_path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, ResultExt};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".stockscan"),
        |dirs| dirs.home_dir().join(".stockscan"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Thresholds
// ============================================================================

/// Cut-off thresholds for the screen.
///
/// No range is enforced; any finite or infinite value is accepted as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Maximum trailing PE
    #[serde(default = "default_max_pe")]
    pub max_pe: f64,

    /// Maximum EV/EBITDA
    #[serde(default = "default_max_ev_ebitda")]
    pub max_ev_ebitda: f64,

    /// Minimum revenue YoY growth (%)
    #[serde(default = "default_min_growth_pct")]
    pub min_revenue_growth_pct: f64,

    /// Minimum diluted EPS YoY growth (%)
    #[serde(default = "default_min_growth_pct")]
    pub min_eps_growth_pct: f64,

    /// Minimum Sortino ratio (daily returns)
    #[serde(default = "default_min_sortino")]
    pub min_sortino: f64,

    /// Minimum annualised alpha
    #[serde(default)]
    pub min_alpha: f64,

    /// Minimum CROCI (%)
    #[serde(default = "default_min_croci_pct")]
    pub min_croci_pct: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_pe: default_max_pe(),
            max_ev_ebitda: default_max_ev_ebitda(),
            min_revenue_growth_pct: default_min_growth_pct(),
            min_eps_growth_pct: default_min_growth_pct(),
            min_sortino: default_min_sortino(),
            min_alpha: 0.0,
            min_croci_pct: default_min_croci_pct(),
        }
    }
}

impl ThresholdConfig {
    /// One-line summary for logs and report headers.
    pub fn summary(&self) -> String {
        format!(
            "PE<{} or EV/EBITDA<{}, Rev>{}%, EPS>{}%, Sortino>{}, Alpha>{}, CROCI>{}%",
            self.max_pe,
            self.max_ev_ebitda,
            self.min_revenue_growth_pct,
            self.min_eps_growth_pct,
            self.min_sortino,
            self.min_alpha,
            self.min_croci_pct
        )
    }
}

fn default_max_pe() -> f64 {
    15.0
}

fn default_max_ev_ebitda() -> f64 {
    12.0
}

fn default_min_growth_pct() -> f64 {
    10.0
}

fn default_min_sortino() -> f64 {
    1.0
}

fn default_min_croci_pct() -> f64 {
    15.0
}

// ============================================================================
// Scanner
// ============================================================================

/// Scan execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Reference index for alpha (e.g., "SPY")
    #[serde(default = "default_benchmark_symbol")]
    pub benchmark_symbol: String,

    /// Price history lookback in years
    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,

    /// Minimum daily return observations for a ticker to be scanned
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Minimum aligned observations for the alpha regression
    #[serde(default = "default_min_alpha_overlap")]
    pub min_alpha_overlap: usize,

    /// Trading periods per year used to annualise alpha
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,

    /// Number of tickers evaluated concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-ticker timeout covering all of its fetches
    #[serde(default = "default_ticker_timeout_secs")]
    pub ticker_timeout_secs: u64,

    /// How long a fetched benchmark series stays valid
    #[serde(default = "default_benchmark_ttl_secs")]
    pub benchmark_ttl_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            benchmark_symbol: default_benchmark_symbol(),
            lookback_years: default_lookback_years(),
            min_observations: default_min_observations(),
            min_alpha_overlap: default_min_alpha_overlap(),
            periods_per_year: default_periods_per_year(),
            concurrency: default_concurrency(),
            ticker_timeout_secs: default_ticker_timeout_secs(),
            benchmark_ttl_secs: default_benchmark_ttl_secs(),
        }
    }
}

impl ScannerConfig {
    /// Validate settings that would make a scan meaningless.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("scanner.concurrency must be at least 1".into()));
        }
        if self.min_observations < 2 {
            return Err(Error::Config(
                "scanner.min_observations must be at least 2".into(),
            ));
        }
        if self.lookback_years == 0 {
            return Err(Error::Config("scanner.lookback_years must be at least 1".into()));
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(Error::Config("scanner.benchmark_symbol is empty".into()));
        }
        Ok(())
    }
}

fn default_benchmark_symbol() -> String {
    "SPY".into()
}

fn default_lookback_years() -> u32 {
    3
}

fn default_min_observations() -> usize {
    252
}

fn default_min_alpha_overlap() -> usize {
    30
}

fn default_periods_per_year() -> u32 {
    252
}

fn default_concurrency() -> usize {
    8
}

fn default_ticker_timeout_secs() -> u64 {
    30
}

fn default_benchmark_ttl_secs() -> u64 {
    3600
}

// ============================================================================
// Data Source
// ============================================================================

/// Market data HTTP source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Base URL of the market data API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Proactive rate limit (requests per minute)
    #[serde(default = "default_rate_limit_rpm")]
    pub rate_limit_rpm: u32,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page visited once to obtain the session cookie the crumb is bound to
    #[serde(default = "default_session_url")]
    pub session_url: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_rpm: default_rate_limit_rpm(),
            user_agent: default_user_agent(),
            session_url: default_session_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://query2.finance.yahoo.com".into()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_rate_limit_rpm() -> u32 {
    120
}

fn default_session_url() -> String {
    "https://fc.yahoo.com".into()
}

fn default_user_agent() -> String {
    concat!("stockscan/", env!("CARGO_PKG_VERSION")).into()
}

// ============================================================================
// Universe
// ============================================================================

/// Default ticker universe source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// CSV listing with a `Symbol` column
    #[serde(default = "default_constituents_url")]
    pub constituents_url: String,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            constituents_url: default_constituents_url(),
        }
    }
}

fn default_constituents_url() -> String {
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv"
        .into()
}

// ============================================================================
// Export
// ============================================================================

/// Export destinations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Path to a service-account JSON key for sheet upload
    #[serde(default)]
    pub sheets_credentials_path: Option<PathBuf>,

    /// Destination spreadsheet URL
    #[serde(default)]
    pub sheet_url: Option<String>,
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub data_source: DataSourceConfig,

    #[serde(default)]
    pub universe: UniverseConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply `STOCKSCAN_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("STOCKSCAN_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("STOCKSCAN_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(symbol) = lookup("STOCKSCAN_BENCHMARK") {
            self.scanner.benchmark_symbol = symbol.trim().to_uppercase();
        }
        if let Some(n) = lookup("STOCKSCAN_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.scanner.concurrency = n;
        }
        if let Some(secs) = lookup("STOCKSCAN_TICKER_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.scanner.ticker_timeout_secs = secs;
        }
        if let Some(path) = lookup("STOCKSCAN_SHEETS_CREDENTIALS") {
            self.export.sheets_credentials_path = Some(PathBuf::from(path));
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        ResultExt::context(self.scanner.validate(), "invalid scanner settings")?;
        if self.data_source.base_url.trim().is_empty() {
            return Err(Error::Config("data_source.base_url is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn test_threshold_defaults() {
        let t = ThresholdConfig::default();
        assert_eq!(t.max_pe, 15.0);
        assert_eq!(t.max_ev_ebitda, 12.0);
        assert_eq!(t.min_revenue_growth_pct, 10.0);
        assert_eq!(t.min_eps_growth_pct, 10.0);
        assert_eq!(t.min_sortino, 1.0);
        assert_eq!(t.min_alpha, 0.0);
        assert_eq!(t.min_croci_pct, 15.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"thresholds": {"max_pe": 25.0}, "scanner": {"concurrency": 2}}"#)
                .unwrap();
        assert_eq!(config.thresholds.max_pe, 25.0);
        assert_eq!(config.thresholds.max_ev_ebitda, 12.0);
        assert_eq!(config.scanner.concurrency, 2);
        assert_eq!(config.scanner.benchmark_symbol, "SPY");
        assert_eq!(config.scanner.min_observations, 252);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"observability": {{"level": "debug", "format": "json"}}}}"#).unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKSCAN_LOG_LEVEL", "trace"),
            ("STOCKSCAN_BENCHMARK", " qqq "),
            ("STOCKSCAN_CONCURRENCY", "16"),
            ("STOCKSCAN_TICKER_TIMEOUT_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.observability.log_level, "trace");
        assert_eq!(config.scanner.benchmark_symbol, "QQQ");
        assert_eq!(config.scanner.concurrency, 16);
        assert_eq!(config.scanner.ticker_timeout_secs, 30);
    }

    #[test_case(|c: &mut ScannerConfig| c.concurrency = 0 ; "zero concurrency")]
    #[test_case(|c: &mut ScannerConfig| c.min_observations = 1 ; "too few observations")]
    #[test_case(|c: &mut ScannerConfig| c.lookback_years = 0 ; "zero lookback")]
    #[test_case(|c: &mut ScannerConfig| c.benchmark_symbol = "  ".into() ; "blank benchmark")]
    fn test_scanner_validation_rejects(mutate: fn(&mut ScannerConfig)) {
        let mut scanner = ScannerConfig::default();
        mutate(&mut scanner);
        assert!(scanner.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_keeps_exit_code() {
        let mut config = Config::default();
        config.scanner.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("invalid scanner settings"));
    }

    #[test]
    fn test_threshold_summary() {
        let summary = ThresholdConfig::default().summary();
        assert!(summary.contains("PE<15"));
        assert!(summary.contains("CROCI>15%"));
    }
}
