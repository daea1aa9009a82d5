//! Raw records -> dense, date-indexed tables.
//!
//! The wrangler is the only piece of real data logic in the dashboard:
//!
//! - the row index spans every calendar day from the earliest to the latest
//!   record date (inclusive, no gaps)
//! - the first record seen for a `(date, column)` cell wins; later duplicates
//!   are ignored
//! - `null` values and days with no record for a column become `0.0`
//!
//! Everything here is pure: no I/O, no shared state.

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::{DateRange, RawRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Broad category of a wrangling failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A date or numeric value could not be interpreted.
    Parse,
    /// The caller violated an input requirement (empty input, unknown column, ...).
    Precondition,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WrangleError {
    #[error("cannot build a table from an empty record list")]
    EmptyInput,
    #[error("no columns requested")]
    NoColumns,
    #[error("record {index} has no `Date` field")]
    MissingDate { index: usize },
    #[error("record {index} has an invalid date '{value}': {reason}")]
    InvalidDate {
        index: usize,
        value: String,
        reason: String,
    },
    #[error("invalid value {value} for '{column}' on {date}")]
    InvalidValue {
        date: NaiveDate,
        column: String,
        value: String,
    },
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("date range {range} lies outside the table ({first} .. {last})")]
    RangeOutOfBounds {
        range: DateRange,
        first: NaiveDate,
        last: NaiveDate,
    },
}

impl WrangleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WrangleError::MissingDate { .. }
            | WrangleError::InvalidDate { .. }
            | WrangleError::InvalidValue { .. } => ErrorKind::Parse,
            WrangleError::EmptyInput
            | WrangleError::NoColumns
            | WrangleError::UnknownColumn(_)
            | WrangleError::RangeOutOfBounds { .. } => ErrorKind::Precondition,
        }
    }
}

/// A gap-free daily table. Every cell holds a finite value.
#[derive(Debug, Clone, PartialEq)]
pub struct WrangledTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    /// Column-major: `values[c][row]`.
    values: Vec<Vec<f64>>,
}

impl WrangledTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Full date span of the table.
    pub fn span(&self) -> DateRange {
        DateRange::new(self.first_date(), self.last_date())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.column_index(name)?;
        Some(&self.values[idx])
    }

    pub fn value(&self, date: NaiveDate, column: &str) -> Option<f64> {
        let row = self.row_index(date)?;
        self.column(column).map(|values| values[row])
    }

    /// Iterate rows as `(date, values in column order)`.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<f64>)> + '_ {
        self.dates.iter().enumerate().map(|(row, &date)| {
            let cells = self.values.iter().map(|col| col[row]).collect();
            (date, cells)
        })
    }

    /// Inclusive date slice restricted to `columns` (kept in the order given).
    ///
    /// The range is clamped to the table's span; a range that does not overlap
    /// the table at all is an error.
    pub fn select(&self, range: DateRange, columns: &[&str]) -> Result<WrangledTable, WrangleError> {
        if columns.is_empty() {
            return Err(WrangleError::NoColumns);
        }
        let span = self.span();
        if range.end < span.start || range.start > span.end {
            return Err(WrangleError::RangeOutOfBounds {
                range,
                first: span.start,
                last: span.end,
            });
        }
        let clamped = range.clamp_to(&span);
        let lo = self.row_index(clamped.start).unwrap_or(0);
        let hi = self.row_index(clamped.end).unwrap_or(self.dates.len() - 1);

        let mut out_columns = Vec::with_capacity(columns.len());
        let mut out_values = Vec::with_capacity(columns.len());
        for &name in columns {
            let idx = self
                .column_index(name)
                .ok_or_else(|| WrangleError::UnknownColumn(name.to_string()))?;
            out_columns.push(self.columns[idx].clone());
            out_values.push(self.values[idx][lo..=hi].to_vec());
        }

        Ok(WrangledTable {
            dates: self.dates[lo..=hi].to_vec(),
            columns: out_columns,
            values: out_values,
        })
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn row_index(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - *self.dates.first()?).num_days();
        if offset < 0 {
            return None;
        }
        let offset = offset as usize;
        (offset < self.dates.len()).then_some(offset)
    }
}

/// Build a dense daily table for `columns` from `records`.
///
/// Fields not listed in `columns` are ignored. Errors are returned as-is;
/// nothing is swallowed or defaulted beyond the documented zero fill.
pub fn wrangle(records: &[RawRecord], columns: &[&str]) -> Result<WrangledTable, WrangleError> {
    if records.is_empty() {
        return Err(WrangleError::EmptyInput);
    }
    if columns.is_empty() {
        return Err(WrangleError::NoColumns);
    }

    // 1) Parse dates up front: this both validates and finds the span.
    let mut parsed = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        parsed.push(parse_record_date(index, record)?);
    }
    let first = parsed.iter().copied().min().ok_or(WrangleError::EmptyInput)?;
    let last = parsed.iter().copied().max().ok_or(WrangleError::EmptyInput)?;

    // 2) Empty grid over the full span.
    let n_rows = (last - first).num_days() as usize + 1;
    let dates: Vec<NaiveDate> = first.iter_days().take(n_rows).collect();
    let mut cells: Vec<Vec<Option<f64>>> = vec![vec![None; n_rows]; columns.len()];

    // 3) First write wins.
    for (record, &date) in records.iter().zip(&parsed) {
        let row = (date - first).num_days() as usize;
        for (c, &column) in columns.iter().enumerate() {
            let Some(raw) = record.get(column) else {
                continue;
            };
            if cells[c][row].is_some() {
                continue;
            }
            cells[c][row] = Some(coerce_value(raw, date, column)?);
        }
    }

    // 4) Zero-fill whatever no record touched.
    let values = cells
        .into_iter()
        .map(|col| col.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        .collect();

    Ok(WrangledTable {
        dates,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

fn parse_record_date(index: usize, record: &RawRecord) -> Result<NaiveDate, WrangleError> {
    let raw = match record.date() {
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(WrangleError::InvalidDate {
                index,
                value: other.to_string(),
                reason: "expected a string".to_string(),
            });
        }
        None => return Err(WrangleError::MissingDate { index }),
    };
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| WrangleError::InvalidDate {
        index,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn coerce_value(raw: &Value, date: NaiveDate, column: &str) -> Result<f64, WrangleError> {
    let parsed = match raw {
        // The API's "no data" marker.
        Value::Null => return Ok(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(WrangleError::InvalidValue {
            date,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}
