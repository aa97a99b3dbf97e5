//! CSV tables with an explicit column contract.
//!
//! Producers declare canonical column names and consumers look them up by
//! exact (whitespace-trimmed) match. A missing column fails with
//! [`CavError::MissingInputColumn`] listing the columns that are present.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CavError, ErrorInfo, Stage};
use crate::floats::parse_sentinel_f64;

fn table_error(code: &str, err: impl ToString, table: &str) -> CavError {
    CavError::Serde(
        ErrorInfo::new(code, err.to_string())
            .with_stage(Stage::Io)
            .with_context("table", table),
    )
}

/// In-memory CSV table keyed by header names.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    label: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Reads a headed CSV table from disk.
    pub fn read_path(path: impl AsRef<Path>) -> Result<Self, CavError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| CavError::io("table-open", err, path))?;
        Self::read(file, path.display().to_string())
    }

    /// Reads a headed CSV table from any reader.
    pub fn read<R: Read>(reader: R, label: impl Into<String>) -> Result<Self, CavError> {
        let label = label.into();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|err| table_error("table-headers", err, &label))?
            .iter()
            .map(|name| name.trim().to_string())
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|err| table_error("table-row", err, &label))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self {
            label,
            headers,
            rows,
        })
    }

    /// Table label used in diagnostics (usually the source path).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a declared column.
    pub fn column_index(&self, name: &str) -> Result<usize, CavError> {
        self.headers
            .iter()
            .position(|header| header == name.trim())
            .ok_or_else(|| {
                CavError::MissingInputColumn(
                    ErrorInfo::new(
                        "missing-column",
                        format!("table '{}' has no column '{}'", self.label, name),
                    )
                    .with_stage(Stage::Io)
                    .with_context("table", self.label.clone())
                    .with_context("column", name)
                    .with_context("available", self.headers.join(", "))
                    .with_hint("declare the canonical column names in the table schema"),
                )
            })
    }

    /// Raw text values of a column.
    pub fn text_column(&self, name: &str) -> Result<Vec<String>, CavError> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or_default())
            .collect())
    }

    /// Numeric values of a column; `inf`/`nan` sentinels are accepted.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, CavError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let cell = row.get(idx).map(String::as_str).unwrap_or("");
                parse_sentinel_f64(cell).ok_or_else(|| {
                    CavError::InvalidInput(
                        ErrorInfo::new(
                            "non-numeric-cell",
                            format!("column '{name}' row {row_idx} is not numeric: '{cell}'"),
                        )
                        .with_stage(Stage::Io)
                        .with_context("table", self.label.clone())
                        .with_record(format!("row {row_idx}")),
                    )
                })
            })
            .collect()
    }
}

/// Canonical column names for a two-column numeric table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XyColumns {
    /// Abscissa column (frequency, time).
    pub x: String,
    /// Ordinate column (power, enhancement, field value).
    pub y: String,
}

impl XyColumns {
    /// Creates a column pair.
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    /// Reads both declared columns from a table.
    pub fn read(&self, table: &Table) -> Result<(Vec<f64>, Vec<f64>), CavError> {
        Ok((table.numeric_column(&self.x)?, table.numeric_column(&self.y)?))
    }
}

/// Writes a headed CSV file.
pub fn write_csv<I>(path: impl AsRef<Path>, headers: &[&str], rows: I) -> Result<(), CavError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|err| CavError::io("csv-create", err, path))?;
    write_csv_to(file, headers, rows).map_err(|err| match err {
        CavError::Serde(info) => {
            CavError::Serde(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Writes a headed CSV stream to any writer.
pub fn write_csv_to<W, I>(writer: W, headers: &[&str], rows: I) -> Result<(), CavError>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers)
        .map_err(|err| table_error("csv-write", err, "output"))?;
    for row in rows {
        wtr.write_record(&row)
            .map_err(|err| table_error("csv-write", err, "output"))?;
    }
    wtr.flush()
        .map_err(|err| table_error("csv-flush", err, "output"))
}
