//! Memoized benchmark return series.
//!
//! All alpha computations in a scan must regress against the same benchmark
//! window, so the series is fetched once and handed to every evaluation as a
//! shared read-only value. The fetched series stays valid for a configurable
//! TTL; after that the next caller refreshes it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::cache::TtlCache;
use super::provider::{DataProvider, ProviderError};
use super::{Interval, Lookback, ReturnSeries};

/// Fetch-once-then-reuse holder for the benchmark series.
pub struct BenchmarkProvider<P: DataProvider> {
    provider: Arc<P>,
    symbol: String,
    lookback: Lookback,
    cache: TtlCache<Arc<ReturnSeries>>,
    refresh: Mutex<()>,
}

impl<P: DataProvider> BenchmarkProvider<P> {
    pub fn new(provider: Arc<P>, symbol: impl Into<String>, lookback: Lookback, ttl: Duration) -> Self {
        Self {
            provider,
            symbol: symbol.into(),
            lookback,
            cache: TtlCache::new(ttl),
            refresh: Mutex::new(()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Benchmark daily returns, fetched at most once per TTL window.
    ///
    /// Concurrent callers arriving during a refresh wait for it and share
    /// its result.
    pub async fn returns(&self) -> Result<Arc<ReturnSeries>, ProviderError> {
        if let Some(series) = self.cache.get() {
            debug!(symbol = %self.symbol, "Benchmark cache hit");
            return Ok(series);
        }

        let _guard = self.refresh.lock().await;
        if let Some(series) = self.cache.get() {
            return Ok(series);
        }

        let stats = self.cache.stats();
        debug!(
            symbol = %self.symbol,
            expired = stats.expired,
            age_secs = stats.age.map(|a| a.as_secs()),
            "Benchmark cache miss"
        );

        let history = self
            .provider
            .get_price_history(&self.symbol, self.lookback, Interval::Daily)
            .await?;
        let series = Arc::new(history.returns());

        if series.is_empty() {
            return Err(ProviderError::DataNotAvailable(format!(
                "benchmark {} returned no usable prices",
                self.symbol
            )));
        }

        info!(
            symbol = %self.symbol,
            observations = series.len(),
            ttl_secs = self.cache.ttl().as_secs(),
            "Benchmark series fetched"
        );
        self.cache.set(Arc::clone(&series));
        Ok(series)
    }

    /// Force the next call to refetch.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
