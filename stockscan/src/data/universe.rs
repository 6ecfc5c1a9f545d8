//! Ticker universe sources.
//!
//! - `ConstituentsUniverse`: index constituents from a CSV listing, fetched
//!   once per process
//! - `StaticUniverse`: a fixed list (user-supplied tickers, tests)

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::provider::{ProviderError, UniverseSource};

/// Split free-form user input into ticker symbols.
///
/// Accepts any mix of whitespace, commas and newlines as separators,
/// uppercases each symbol and drops empties and repeats (first one wins).
pub fn parse_ticker_list(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Normalise a listing symbol to the quote-provider form (BRK.B → BRK-B).
fn normalise_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

// ============================================================================
// Static Universe
// ============================================================================

/// Fixed ticker list.
#[derive(Debug, Clone)]
pub struct StaticUniverse {
    tickers: Vec<String>,
}

impl StaticUniverse {
    pub fn new(tickers: Vec<String>) -> Self {
        Self { tickers }
    }
}

#[async_trait]
impl UniverseSource for StaticUniverse {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_default_universe(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.tickers.clone())
    }
}

// ============================================================================
// Constituents Universe
// ============================================================================

/// Index constituents loaded from a CSV listing with a `Symbol` column.
///
/// The listing is fetched on first use and cached for the process lifetime.
/// A failed fetch is not cached, so the next call retries.
pub struct ConstituentsUniverse {
    url: String,
    client: reqwest::Client,
    cached: OnceCell<Vec<String>>,
}

impl ConstituentsUniverse {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            client,
            cached: OnceCell::new(),
        }
    }

    /// Create from config
    pub fn from_config(config: &stockscan_common::Config) -> Self {
        Self::new(config.universe.constituents_url.clone())
    }

    async fn fetch(&self) -> Result<Vec<String>, ProviderError> {
        debug!(url = %self.url, "Fetching universe constituents");

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Internal(format!("HTTP {} from {}", status, self.url)));
        }

        let body = response.text().await?;
        let tickers = parse_constituents_csv(&body)?;

        if tickers.is_empty() {
            return Err(ProviderError::DataNotAvailable("constituents listing is empty".into()));
        }

        info!(count = tickers.len(), "Loaded universe constituents");
        Ok(tickers)
    }
}

/// Extract the `Symbol` column from a constituents CSV.
fn parse_constituents_csv(body: &str) -> Result<Vec<String>, ProviderError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let column = reader
        .headers()
        .map_err(|e| ProviderError::Malformed(e.to_string()))?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("symbol"))
        .ok_or_else(|| ProviderError::Malformed("constituents CSV has no Symbol column".into()))?;

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ProviderError::Malformed(e.to_string()))?;
        if let Some(raw) = record.get(column) {
            let symbol = normalise_symbol(raw);
            if !symbol.is_empty() && seen.insert(symbol.clone()) {
                tickers.push(symbol);
            }
        }
    }

    Ok(tickers)
}

#[async_trait]
impl UniverseSource for ConstituentsUniverse {
    fn name(&self) -> &'static str {
        "constituents"
    }

    async fn get_default_universe(&self) -> Result<Vec<String>, ProviderError> {
        self.cached
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ticker_list_separators() {
        let tickers = parse_ticker_list("aapl, msft\nnvda  goog,,\n\tamzn");
        assert_eq!(tickers, vec!["AAPL", "MSFT", "NVDA", "GOOG", "AMZN"]);
    }

    #[test]
    fn test_parse_ticker_list_dedups() {
        assert_eq!(parse_ticker_list("AAPL aapl MSFT AAPL"), vec!["AAPL", "MSFT"]);
        assert!(parse_ticker_list("  ,\n ").is_empty());
    }

    #[test]
    fn test_parse_constituents_csv() {
        let body = "Symbol,Security,GICS Sector\nMMM,3M,Industrials\nBRK.B,Berkshire Hathaway,Financials\nMMM,3M,Industrials\n";
        let tickers = parse_constituents_csv(body).unwrap();
        assert_eq!(tickers, vec!["MMM", "BRK-B"]);
    }

    #[test]
    fn test_parse_constituents_csv_without_symbol_column() {
        let err = parse_constituents_csv("Ticker,Name\nMMM,3M\n").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_static_universe() {
        let universe = StaticUniverse::new(vec!["AAPL".into(), "MSFT".into()]);
        assert_eq!(universe.get_default_universe().await.unwrap().len(), 2);
    }
}
