//! Export wrangled tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! a `date` column followed by one column per field, every cell filled.

use std::path::Path;

use crate::error::AppError;
use crate::wrangle::WrangledTable;

/// Write a table to a CSV file.
pub fn write_table_csv(path: &Path, table: &WrangledTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(&mut writer, table)?;
    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn write_table<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &WrangledTable) -> Result<(), AppError> {
    let mut header = vec!["date".to_string()];
    header.extend(table.columns().iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for (date, values) in table.rows() {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(date.to_string());
        row.extend(values.iter().map(|v| v.to_string()));
        writer
            .write_record(&row)
            .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}
