//! Parse functions - load a CSV file into a typed Dataset

use crate::cleaning::types::{Column, ColumnKind, Dataset, Schema};
use crate::error::{CleaningError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{info, warn};

/// Datetime layouts accepted for `last_review`, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Offset-carrying layout with a space separator; `T` is covered by RFC 3339
const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Date-only layouts accepted for `last_review`
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

/// Read a CSV file, checking the header against `schema` before any row
pub fn read_dataset(path: &Path, schema: &Schema) -> Result<Dataset> {
    info!("Reading dataset from {:?}", path);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    // Header text is kept as written; lookups go through the trimmed form
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(path, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let trimmed: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    if trimmed.iter().all(String::is_empty) {
        return Err(malformed(path, "missing header row".to_string()));
    }
    schema.validate_header(&trimmed, path)?;

    let kinds: Vec<ColumnKind> = trimmed.iter().map(|h| schema.kind_of(h)).collect();
    let mut builders: Vec<Column> = kinds
        .iter()
        .map(|kind| match kind {
            ColumnKind::Number => Column::Number(Vec::new()),
            ColumnKind::Text => Column::Text(Vec::new()),
        })
        .collect();

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header
        let line = idx + 2;
        let record = result.map_err(|e| malformed(path, format!("line {}: {}", line, e)))?;

        for (col, (cell, builder)) in record.iter().zip(builders.iter_mut()).enumerate() {
            match builder {
                Column::Number(values) => {
                    let value = parse_number(cell).ok_or_else(|| {
                        malformed(
                            path,
                            format!(
                                "line {}: column '{}' is not numeric: {:?}",
                                line, trimmed[col], cell
                            ),
                        )
                    })?;
                    values.push(value);
                }
                Column::Text(values) => values.push(cell.to_string()),
                Column::Timestamp(values) => values.push(parse_timestamp(cell)),
            }
        }
    }

    let mut dataset = Dataset::new();
    for (name, column) in header.into_iter().zip(builders) {
        dataset
            .push_column(name, column)
            .map_err(|e| malformed(path, e.to_string()))?;
    }

    let (rows, cols) = dataset.shape();
    info!("Loaded dataset with shape ({}, {})", rows, cols);

    Ok(dataset)
}

/// Parse a numeric cell. Empty cells and `NaN` are null; anything else
/// that does not parse is rejected.
pub fn parse_number(cell: &str) -> Option<Option<f64>> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    trimmed.parse::<f64>().ok().map(Some)
}

/// Parse a date-like string into a timestamp
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Offsets are normalized to UTC
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, OFFSET_FORMAT))
    {
        return Some(ts.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Coerce a text column to timestamps. Unparseable values become null.
/// Returns the new column and the number of non-empty values that failed.
pub fn coerce_timestamps(values: &[String], column: &str) -> (Column, usize) {
    let mut failures = 0;

    let parsed: Vec<Option<NaiveDateTime>> = values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let ts = parse_timestamp(value);
            if ts.is_none() && !value.trim().is_empty() {
                failures += 1;
                if failures <= 10 {
                    // Only log first 10 failures
                    warn!("Unparseable {} at row {}: {:?}", column, row, value);
                }
            }
            ts
        })
        .collect();

    (Column::Timestamp(parsed), failures)
}

fn malformed(path: &Path, message: String) -> CleaningError {
    CleaningError::MalformedInput {
        path: path.to_path_buf(),
        message,
    }
}
