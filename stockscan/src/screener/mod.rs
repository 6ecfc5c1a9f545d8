//! Stock screener.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  tickers   ┌─────────────────┐  fetch   ┌──────────────┐
//! │  ScanEngine  │──────────▶│ TickerEvaluator │────────▶│ DataProvider │
//! │ (orchestrate)│◀──────────│ (metrics+screen)│          └──────────────┘
//! └──────┬───────┘  records   └─────────────────┘
//!        │ once per TTL
//!        ▼
//! ┌──────────────────┐
//! │ BenchmarkProvider│
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stockscan::screener::{ScanEngine, ScanReport, ScreenerConfig, ReportFormat};
//!
//! let engine = ScanEngine::new(provider, ScreenerConfig::from_config(&config));
//! let result = engine.run(&tickers).await?;
//! println!("{}", ScanReport::new(&result).generate(ReportFormat::Text));
//! ```

pub mod config;
pub mod engine;
pub mod evaluator;
pub mod record;
pub mod report;

pub use config::ScreenerConfig;
pub use engine::ScanEngine;
pub use evaluator::{passes, screen, SkipReason, TickerEvaluator};
pub use record::{MetricSet, PassingRow, ScanRecord, ScanResult, COLUMNS};
pub use report::{ReportFormat, ScanReport};
