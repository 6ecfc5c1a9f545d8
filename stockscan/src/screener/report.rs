//! Report rendering for scan results.
//!
//! Formats:
//! - Text (aligned table for the terminal)
//! - Markdown
//! - JSON (undefined metrics as `null`)
//!
//! Only passing rows are shown, sorted by alpha descending.

use serde::Serialize;

use super::record::{PassingRow, ScanResult, COLUMNS};

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Aligned plain-text table
    #[default]
    Text,
    /// Markdown table
    Markdown,
    /// JSON document
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "table" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

// ============================================================================
// Scan Report
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    scan_id: &'a str,
    summary: String,
    total_submitted: usize,
    evaluated: usize,
    passed: usize,
    skipped: usize,
    cancelled: bool,
    thresholds: &'a str,
    duration_secs: f64,
    rows: &'a [PassingRow],
}

/// Renders a scan result.
pub struct ScanReport<'a> {
    result: &'a ScanResult,
    rows: Vec<PassingRow>,
}

impl<'a> ScanReport<'a> {
    pub fn new(result: &'a ScanResult) -> Self {
        Self {
            result,
            rows: result.passing(),
        }
    }

    /// Passing rows in presentation order.
    pub fn rows(&self) -> &[PassingRow] {
        &self.rows
    }

    pub fn generate(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_text(),
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Sortino and alpha are small per-period figures; two decimals would
    /// show distinct values as ties.
    fn cells(row: &PassingRow) -> Vec<String> {
        let m = &row.metrics;
        vec![
            row.ticker.clone(),
            format!("{:.2}", m.pe),
            format!("{:.2}", m.ev_to_ebitda),
            format!("{:.2}", m.revenue_growth_pct),
            format!("{:.2}", m.eps_growth_pct),
            format!("{:.4}", m.sortino),
            format!("{:.4}", m.alpha),
            format!("{:.2}", m.croci_pct),
        ]
    }

    /// Aligned text table followed by the summary line.
    pub fn to_text(&self) -> String {
        let body: Vec<Vec<String>> = self.rows.iter().map(Self::cells).collect();

        let widths: Vec<usize> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, header)| {
                body.iter()
                    .map(|cells| cells[i].len())
                    .chain(std::iter::once(header.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    // ticker left-aligned, numbers right-aligned
                    if i == 0 {
                        format!("{:<width$}", cell, width = *width)
                    } else {
                        format!("{:>width$}", cell, width = *width)
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        if self.rows.is_empty() {
            out.push_str("No stocks met all the criteria.\n");
        } else {
            out.push_str(&line(COLUMNS.to_vec()));
            out.push('\n');
            let rule: usize = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
            out.push_str(&"-".repeat(rule));
            out.push('\n');
            for cells in &body {
                out.push_str(&line(cells.iter().map(String::as_str).collect()));
                out.push('\n');
            }
        }

        out.push('\n');
        out.push_str(&self.footer());
        out
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Stock Scan\n\n");
        md.push_str(&format!(
            "**Scan ID**: {}\n**Time**: {}\n**Duration**: {:.1}s\n\n",
            self.result.scan_id,
            self.result.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.result.duration_secs
        ));
        md.push_str(&format!("- **Thresholds**: {}\n", self.result.thresholds));
        md.push_str(&format!("- **Result**: {}\n\n", self.result.summary()));

        if self.rows.is_empty() {
            md.push_str("No stocks met all the criteria.\n");
            return md;
        }

        md.push_str(&format!("| {} |\n", COLUMNS.join(" | ")));
        md.push_str(&format!("|{}\n", "---|".repeat(COLUMNS.len())));
        for row in &self.rows {
            md.push_str(&format!("| {} |\n", Self::cells(row).join(" | ")));
        }

        md
    }

    pub fn to_json(&self) -> String {
        let report = JsonReport {
            scan_id: &self.result.scan_id,
            summary: self.result.summary(),
            total_submitted: self.result.total_submitted,
            evaluated: self.result.records.len(),
            passed: self.rows.len(),
            skipped: self.result.skipped,
            cancelled: self.result.cancelled,
            thresholds: &self.result.thresholds,
            duration_secs: self.result.duration_secs,
            rows: &self.rows,
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }

    fn footer(&self) -> String {
        let mut footer = format!(
            "{} ({} evaluated, {} skipped) in {:.1}s\n",
            self.result.summary(),
            self.result.records.len(),
            self.result.skipped,
            self.result.duration_secs
        );
        if self.result.cancelled {
            footer.push_str(&format!(
                "Scan cancelled: {} tickers not started\n",
                self.result.not_started
            ));
        }
        footer
    }
}
