//! Data provider abstraction.
//!
//! Defines the `DataProvider` trait every market data source implements and
//! the `UniverseSource` trait for default ticker lists. Both are treated as
//! unreliable: any call may fail or return partial data.

use async_trait::async_trait;
use std::fmt;

use super::{FinancialStatement, Interval, Lookback, PriceHistory, SnapshotInfo};

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to data providers.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Network error (connection failed, timeout)
    Network(String),
    /// Rate limit exceeded
    RateLimited { retry_after_secs: Option<u64> },
    /// Data not available for the requested symbol
    DataNotAvailable(String),
    /// Response did not match the expected schema
    Malformed(String),
    /// Session rejected (missing or expired cookie/crumb)
    Unauthorized(String),
    /// Internal provider error
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {} seconds", secs)?;
                }
                Ok(())
            }
            Self::DataNotAvailable(msg) => write!(f, "Data not available: {}", msg),
            Self::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Check if the error is transient.
    ///
    /// A scan does not retry tickers either way; transient failures are
    /// logged as warnings, permanent ones at debug.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Unauthorized(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network("Request timeout".into())
        } else if e.is_connect() {
            Self::Network("Connection failed".into())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

// ============================================================================
// Data Provider Trait
// ============================================================================

/// Trait for market data providers.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Provider name (e.g., "yahoo")
    fn name(&self) -> &'static str;

    /// Closing price history for a symbol, ordered by date ascending.
    async fn get_price_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<PriceHistory, ProviderError>;

    /// Point-in-time valuation snapshot.
    async fn get_snapshot_info(&self, symbol: &str) -> Result<SnapshotInfo, ProviderError>;

    /// Annual income statement (revenue, diluted EPS).
    async fn get_income_statement(&self, symbol: &str)
        -> Result<FinancialStatement, ProviderError>;

    /// Annual cash flow statement (operating cash flow, capex).
    async fn get_cash_flow(&self, symbol: &str) -> Result<FinancialStatement, ProviderError>;

    /// Annual balance sheet (stockholder equity, total debt).
    async fn get_balance_sheet(&self, symbol: &str) -> Result<FinancialStatement, ProviderError>;
}

// ============================================================================
// Universe Source Trait
// ============================================================================

/// Trait for sources of the default ticker universe.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Ticker symbols in the default universe.
    async fn get_default_universe(&self) -> Result<Vec<String>, ProviderError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_recoverable() {
        assert!(ProviderError::Network("timeout".into()).is_recoverable());
        assert!(ProviderError::RateLimited { retry_after_secs: Some(60) }.is_recoverable());
        assert!(ProviderError::Unauthorized("Invalid Crumb".into()).is_recoverable());
        assert!(!ProviderError::DataNotAvailable("no data".into()).is_recoverable());
        assert!(!ProviderError::Malformed("bad json".into()).is_recoverable());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(err.to_string().contains("30 seconds"));

        let err = ProviderError::Malformed("missing chart.result".into());
        assert!(err.to_string().contains("missing chart.result"));
    }
}
