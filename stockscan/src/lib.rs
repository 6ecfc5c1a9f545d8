//! Stockscan Library
//!
//! Screens a universe of equity tickers against valuation, growth,
//! risk-adjusted return, market-relative alpha and profitability thresholds,
//! and exports the passing candidates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          stockscan                               │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐          │
//! │  │  data        │──▶│  metrics     │──▶│  screener    │──▶ export │
//! │  │  (Yahoo,     │   │  (Sortino,   │   │  (evaluate,  │   (CSV,   │
//! │  │   universe)  │   │   alpha, ..) │   │   rank)      │   Sheets) │
//! │  └──────────────┘   └──────────────┘   └──────────────┘          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Screen
//!
//! A ticker passes when all of these hold:
//! - **Valuation**: PE below max, or EV/EBITDA below max
//! - **Growth**: revenue and diluted EPS YoY growth above min
//! - **Risk**: Sortino ratio of daily returns above min
//! - **Alpha**: annualised CAPM alpha against the benchmark above min
//! - **Profitability**: CROCI above min
//!
//! Undefined metrics never pass a comparison.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod export;
pub mod metrics;
pub mod screener;

pub use data::{DataProvider, ProviderError, YahooAdapter};
pub use metrics::{Metric, Truth};
pub use screener::{ScanEngine, ScanResult, ScreenerConfig};
