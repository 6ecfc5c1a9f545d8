//! Export of passing rows.
//!
//! - `csv`: spreadsheet-compatible bytes or a file
//! - `sheets`: overwrite a remote Google Sheet with the rows
//!
//! Export runs after a scan has been rendered. Its failures are reported to
//! the user on their own and never change the scan result.

pub mod csv;
pub mod sheets;

pub use self::csv::{to_csv_bytes, write_csv};
pub use self::sheets::{spreadsheet_id, ServiceAccountKey, SheetsUploader};

use thiserror::Error;

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Service-account blob missing, unreadable or unusable
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Destination URL or sheet not usable
    #[error("invalid destination: {0}")]
    Destination(String),

    /// Remote API rejected a request or was unreachable
    #[error("HTTP error: {0}")]
    Http(String),

    /// Row encoding failed
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ExportError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<::csv::Error> for ExportError {
    fn from(e: ::csv::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}
