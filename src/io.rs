//! Ragged and padded CSV interface
//!
//! Format arrays travel as comma-separated files whose rows may have
//! unequal length; a missing trailing cell means "no value" and is
//! distinct from an explicit sentinel. The padding pipeline reads the
//! ragged file, applies the trailing-column trim rule and the sentinel
//! right-pad, writes the rectangular `*_pad.csv` companion, and reports
//! the resulting column count — the authoritative length for device
//! buffer sizing.

use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array2;

use crate::constants::{INDEX_SENTINEL, VALUE_SENTINEL};
use crate::error::{PlanError, Result};
use crate::format::padding::pad_cells;
use crate::format::GridFormat;

/// Reads a ragged CSV file; empty cells and missing trailing cells are
/// `None`.
///
/// Line-based on purpose: a blank line is a tile with no entries and
/// must stay a row, while CSV readers skip blank lines.
pub fn read_ragged_csv(path: &Path) -> Result<Vec<Vec<Option<f64>>>> {
    use std::io::{BufRead, BufReader};

    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let mut row = Vec::new();
        for cell in line.split(',') {
            let cell = cell.trim();
            if cell.is_empty() {
                row.push(None);
            } else {
                let value = f64::from_str(cell).map_err(|_| PlanError::Parse {
                    what: "csv cell",
                    text: cell.to_string(),
                })?;
                row.push(Some(value));
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a rectangular padded CSV file into a 2-D array.
///
/// Fails with [`PlanError::ArrayShape`] if the rows are not all the same
/// length.
pub fn read_padded_csv<T>(path: &Path) -> Result<Array2<T>>
where
    T: FromStr + Copy,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut values: Vec<T> = Vec::new();
    let mut width: Option<usize> = None;
    let mut rows = 0usize;
    for record in reader.records() {
        let record = record?;
        let expected = *width.get_or_insert(record.len());
        if record.len() != expected {
            return Err(PlanError::ArrayShape {
                expected,
                got: record.len(),
            });
        }
        for cell in record.iter() {
            values.push(T::from_str(cell.trim()).map_err(|_| PlanError::Parse {
                what: "csv cell",
                text: cell.to_string(),
            })?);
        }
        rows += 1;
    }

    let width = width.unwrap_or(0);
    Array2::from_shape_vec((rows, width), values).map_err(|_| PlanError::ArrayShape {
        expected: width,
        got: 0,
    })
}

/// Writes a rectangular array as CSV, one row per line
pub fn write_padded_csv<T: Display>(path: &Path, array: &Array2<T>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for row in array.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Pads one ragged CSV file to its rectangular companion.
///
/// `integer` selects the output formatting of the consuming kernel's
/// dtype (structural arrays are integers, value arrays floats). Returns
/// the padded column count after the trailing-column trim.
pub fn pad_file(input: &Path, output: &Path, fill: f64, integer: bool) -> Result<usize> {
    let rows = read_ragged_csv(input)?;
    let (padded, length) = pad_cells(&rows, fill);

    if integer {
        let ints = padded.mapv(|v| v as i64);
        write_padded_csv(output, &ints)?;
    } else {
        write_padded_csv(output, &padded)?;
    }
    Ok(length)
}

/// Pads every array file of a format under the naming convention
/// `{prefix}_{label}.csv` → `{prefix}_{label}_pad.csv`.
///
/// Returns the padded lengths in the format's array-label order.
pub fn pad_format_files(format: GridFormat, prefix: &Path) -> Result<Vec<usize>> {
    let mut lengths = Vec::new();
    for &label in format.array_labels() {
        let input = suffixed(prefix, &format!("_{label}.csv"));
        let output = suffixed(prefix, &format!("_{label}_pad.csv"));
        let (fill, integer) = if label == "val" {
            (f64::from(VALUE_SENTINEL), false)
        } else {
            (f64::from(INDEX_SENTINEL), true)
        };
        lengths.push(pad_file(&input, &output, fill, integer)?);
    }
    Ok(lengths)
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
