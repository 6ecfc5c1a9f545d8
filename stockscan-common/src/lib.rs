//! Stockscan Common - shared configuration, error types and logging.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    Config, DataSourceConfig, ExportConfig, ObservabilityConfig, ScannerConfig, ThresholdConfig,
    UniverseConfig,
};
pub use error::{Error, Result, ResultExt};
