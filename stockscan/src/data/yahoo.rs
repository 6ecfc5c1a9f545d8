//! Yahoo Finance adapter.
//!
//! # Endpoints
//! - `/v8/finance/chart/{symbol}`: daily closes (adjusted when available)
//! - `/v10/finance/quoteSummary/{symbol}`: trailing PE, EV/EBITDA, market cap
//! - `/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}`: annual
//!   statement line items
//! - `/v1/test/getcrumb`: session crumb required by quote summary
//!
//! # Session
//! Quote summary rejects requests without a crumb tied to a session cookie.
//! The adapter visits the session page once (any status; only the cookie
//! matters), fetches a crumb and reuses it until a 401 says otherwise, then
//! renews it once and retries.
//!
//! # Schema handling
//! Responses are decoded into explicit structures at this boundary. Fields
//! the scanner does not use are ignored; fields it does use that are missing
//! or null become `None` / absent rows rather than zeros.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::provider::{DataProvider, ProviderError};
use super::rate_limiter::{RateLimiter, SharedRateLimiter};
use super::statement::{FinancialStatement, LineItem, StatementKind};
use super::{Interval, Lookback, PriceBar, PriceHistory, SnapshotInfo};

// ============================================================================
// Constants
// ============================================================================

const CHART_ENDPOINT: &str = "/v8/finance/chart";

const QUOTE_SUMMARY_ENDPOINT: &str = "/v10/finance/quoteSummary";

const TIMESERIES_ENDPOINT: &str = "/ws/fundamentals-timeseries/v1/finance/timeseries";

const CRUMB_ENDPOINT: &str = "/v1/test/getcrumb";

const DEFAULT_SESSION_URL: &str = "https://fc.yahoo.com";

/// Modules requested from quote summary
const QUOTE_MODULES: &str = "summaryDetail,defaultKeyStatistics,price";

/// Retry hint after a 429 (seconds)
const RATE_LIMIT_RETRY_SECS: u64 = 2;

/// Annual statement history requested from the timeseries endpoint
const STATEMENT_HISTORY_YEARS: i64 = 6;

/// Timeseries type names and the line items they fill.
const TIMESERIES_TYPES: &[(&str, LineItem)] = &[
    ("annualTotalRevenue", LineItem::TotalRevenue),
    ("annualDilutedEPS", LineItem::DilutedEps),
    ("annualOperatingCashFlow", LineItem::OperatingCashFlow),
    ("annualCapitalExpenditure", LineItem::CapitalExpenditures),
    ("annualStockholdersEquity", LineItem::StockholderEquity),
    ("annualTotalDebt", LineItem::TotalDebt),
];

fn timeseries_line_item(type_name: &str) -> Option<LineItem> {
    TIMESERIES_TYPES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, item)| *item)
}

fn timeseries_types_for(kind: StatementKind) -> Vec<&'static str> {
    TIMESERIES_TYPES
        .iter()
        .filter(|(_, item)| item.statement() == kind)
        .map(|(name, _)| *name)
        .collect()
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    description: Option<String>,
}

impl ApiError {
    fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(c), Some(d)) => format!("{}: {}", c, d),
            (Some(c), None) => c.clone(),
            (None, Some(d)) => d.clone(),
            (None, None) => "unknown error".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
    #[serde(default)]
    adjclose: Vec<AdjCloseIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseIndicator {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    default_key_statistics: KeyStatistics,
    #[serde(default)]
    price: PriceModule,
}

/// `{"raw": 12.3, "fmt": "12.30"}`; Yahoo sends `{}` when a value is unknown.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    enterprise_to_ebitda: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: NaiveDate,
    reported_value: Option<RawValue>,
}

// ============================================================================
// Response Parsing
// ============================================================================

fn parse_chart(symbol: &str, envelope: ChartEnvelope) -> Result<PriceHistory, ProviderError> {
    if let Some(err) = envelope.chart.error {
        return Err(ProviderError::DataNotAvailable(format!("{}: {}", symbol, err.message())));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::Malformed("chart.result is empty".into()))?;

    // Adjusted closes match what a return series should be built from;
    // fall back to raw closes when the provider omits them.
    let closes = match result.indicators.adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    if closes.len() != result.timestamp.len() {
        return Err(ProviderError::Malformed(format!(
            "{} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let offset = result.meta.gmtoffset.unwrap_or(0);
    let bars = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let date = DateTime::<Utc>::from_timestamp(ts + offset, 0)?.date_naive();
            Some(PriceBar { date, close })
        })
        .collect();

    Ok(PriceHistory::new(symbol, bars))
}

fn parse_quote_summary(
    symbol: &str,
    envelope: QuoteSummaryEnvelope,
) -> Result<SnapshotInfo, ProviderError> {
    if let Some(err) = envelope.quote_summary.error {
        return Err(ProviderError::DataNotAvailable(format!("{}: {}", symbol, err.message())));
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::Malformed("quoteSummary.result is empty".into()))?;

    Ok(SnapshotInfo {
        trailing_pe: raw(&result.summary_detail.trailing_pe),
        ev_to_ebitda: raw(&result.default_key_statistics.enterprise_to_ebitda),
        market_cap: raw(&result.summary_detail.market_cap),
        short_name: result.price.short_name,
    })
}

fn parse_timeseries(
    symbol: &str,
    kind: StatementKind,
    envelope: TimeseriesEnvelope,
) -> Result<FinancialStatement, ProviderError> {
    if let Some(err) = envelope.timeseries.error {
        return Err(ProviderError::DataNotAvailable(format!("{}: {}", symbol, err.message())));
    }

    let mut statement = FinancialStatement::new(kind);

    for entry in envelope.timeseries.result.unwrap_or_default() {
        let Some(type_name) = entry
            .pointer("/meta/type/0")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
        else {
            continue;
        };

        let Some(item) = timeseries_line_item(&type_name) else {
            debug!(symbol, type_name = %type_name, "Ignoring unrequested timeseries type");
            continue;
        };

        let Some(points) = entry.get(&type_name).and_then(|v| v.as_array()) else {
            continue;
        };

        // Yahoo pads missing years with null
        for point in points.iter().filter(|p| !p.is_null()) {
            let point: TimeseriesPoint = serde_json::from_value(point.clone())
                .map_err(|e| ProviderError::Malformed(format!("{}: {}", type_name, e)))?;
            if let Some(value) = raw(&point.reported_value) {
                statement.insert(item, point.as_of_date, value);
            }
        }
    }

    Ok(statement)
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// A crumb is a short opaque token; anything else is a consent or error page.
fn parse_crumb(body: &str) -> Result<String, ProviderError> {
    let crumb = body.trim();
    let looks_like_page = crumb.contains(|c: char| c.is_whitespace() || c == '<');
    if crumb.is_empty() || crumb.len() > 64 || looks_like_page {
        return Err(ProviderError::Unauthorized("no crumb issued for this session".into()));
    }
    Ok(crumb.to_string())
}

/// Yahoo Finance market data adapter.
pub struct YahooAdapter {
    base_url: String,
    session_url: String,
    client: reqwest::Client,
    rate_limiter: SharedRateLimiter,
    crumb: Mutex<Option<String>>,
}

impl YahooAdapter {
    /// Create an adapter against the given base URL with default limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(
            base_url,
            Duration::from_secs(20),
            120,
            concat!("stockscan/", env!("CARGO_PKG_VERSION")),
        )
    }

    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Duration,
        rate_limit_rpm: u32,
        user_agent: &str,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .cookie_store(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_url: DEFAULT_SESSION_URL.to_string(),
            client,
            rate_limiter: Arc::new(RateLimiter::new("yahoo", rate_limit_rpm)),
            crumb: Mutex::new(None),
        }
    }

    /// Use a different page to open the session.
    pub fn with_session_url(mut self, session_url: impl Into<String>) -> Self {
        self.session_url = session_url.into();
        self
    }

    /// Create from config
    pub fn from_config(config: &stockscan_common::Config) -> Self {
        let ds = &config.data_source;
        Self::with_options(
            ds.base_url.clone(),
            Duration::from_secs(ds.request_timeout_secs),
            ds.rate_limit_rpm,
            &ds.user_agent,
        )
        .with_session_url(ds.session_url.clone())
    }

    /// GET against the API and map error statuses.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        self.rate_limiter.acquire().await;
        debug!(url = %url, "Fetching from Yahoo");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: Some(RATE_LIMIT_RETRY_SECS),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::DataNotAvailable(format!("{} not found", path)));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unauthorized(body));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Internal(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        self.get(path, query)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))
    }

    /// Cached session crumb, fetched on first use.
    ///
    /// The lock is held across the fetch so concurrent first callers share
    /// one session.
    async fn crumb(&self) -> Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        self.rate_limiter.acquire().await;
        debug!(url = %self.session_url, "Opening Yahoo session");
        self.client.get(&self.session_url).send().await?;

        let body = self.get(CRUMB_ENDPOINT, &[]).await?.text().await?;
        let crumb = parse_crumb(&body)?;
        info!("Obtained Yahoo session crumb");

        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    /// Forget `stale` unless another caller already replaced it.
    async fn invalidate_crumb(&self, stale: &str) {
        let mut cached = self.crumb.lock().await;
        if cached.as_deref() == Some(stale) {
            *cached = None;
        }
    }

    async fn fetch_quote_summary(
        &self,
        symbol: &str,
        crumb: String,
    ) -> Result<QuoteSummaryEnvelope, ProviderError> {
        let query = [("modules", QUOTE_MODULES.to_string()), ("crumb", crumb)];
        self.get_json(&format!("{}/{}", QUOTE_SUMMARY_ENDPOINT, symbol), &query)
            .await
    }

    async fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<FinancialStatement, ProviderError> {
        let now = Utc::now();
        let start = now - ChronoDuration::days(365 * STATEMENT_HISTORY_YEARS);

        let query = [
            ("symbol", symbol.to_string()),
            ("type", timeseries_types_for(kind).join(",")),
            ("period1", start.timestamp().to_string()),
            ("period2", now.timestamp().to_string()),
        ];

        let envelope: TimeseriesEnvelope = self
            .get_json(&format!("{}/{}", TIMESERIES_ENDPOINT, symbol), &query)
            .await?;
        parse_timeseries(symbol, kind, envelope)
    }
}

// ============================================================================
// DataProvider Implementation
// ============================================================================

#[async_trait]
impl DataProvider for YahooAdapter {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn get_price_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<PriceHistory, ProviderError> {
        let query = [
            ("range", lookback.to_api_range()),
            ("interval", interval.to_api_interval().to_string()),
            ("includePrePost", "false".to_string()),
            ("events", "div,splits".to_string()),
        ];

        let envelope: ChartEnvelope = self
            .get_json(&format!("{}/{}", CHART_ENDPOINT, symbol), &query)
            .await?;
        parse_chart(symbol, envelope)
    }

    async fn get_snapshot_info(&self, symbol: &str) -> Result<SnapshotInfo, ProviderError> {
        let crumb = self.crumb().await?;

        let envelope = match self.fetch_quote_summary(symbol, crumb.clone()).await {
            Err(ProviderError::Unauthorized(reason)) => {
                debug!(symbol, reason = %reason, "Crumb rejected, renewing session");
                self.invalidate_crumb(&crumb).await;
                let crumb = self.crumb().await?;
                self.fetch_quote_summary(symbol, crumb).await?
            }
            other => other?,
        };

        parse_quote_summary(symbol, envelope)
    }

    async fn get_income_statement(
        &self,
        symbol: &str,
    ) -> Result<FinancialStatement, ProviderError> {
        self.fetch_statement(symbol, StatementKind::Income).await
    }

    async fn get_cash_flow(&self, symbol: &str) -> Result<FinancialStatement, ProviderError> {
        self.fetch_statement(symbol, StatementKind::CashFlow).await
    }

    async fn get_balance_sheet(&self, symbol: &str) -> Result<FinancialStatement, ProviderError> {
        self.fetch_statement(symbol, StatementKind::BalanceSheet).await
    }
}

// ============================================================================
// Tests
// ============================================================================
