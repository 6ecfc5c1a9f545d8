//! CSV export.

use std::path::Path;

use super::ExportError;
use crate::screener::{PassingRow, COLUMNS};

fn write_rows<W: std::io::Write>(
    writer: &mut ::csv::Writer<W>,
    rows: &[PassingRow],
) -> Result<(), ExportError> {
    writer.write_record(COLUMNS)?;
    for row in rows {
        let mut record = Vec::with_capacity(COLUMNS.len());
        record.push(row.ticker.clone());
        record.extend(
            row.metrics
                .cells()
                .iter()
                .map(|m| m.value().map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Encode rows as CSV. Undefined metrics become empty cells.
pub fn to_csv_bytes(rows: &[PassingRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    write_rows(&mut writer, rows)?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Encoding(e.to_string()))
}

/// Write rows to a CSV file, replacing any existing file.
pub fn write_csv(path: &Path, rows: &[PassingRow]) -> Result<(), ExportError> {
    let mut writer = ::csv::Writer::from_path(path)?;
    write_rows(&mut writer, rows)
}
