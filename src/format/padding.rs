//! Ragged-to-rectangular padding
//!
//! All PEs must receive arrays of identical length, so ragged per-tile
//! rows are right-padded with a sentinel to the longest row. Rows loaded
//! from ragged CSV carry missing cells (`None`), which are distinct from
//! explicit sentinel values; a trailing column where every row is missing
//! is a loading artifact of forcing jagged data into a rectangle and is
//! dropped before padding, changing the reported length.

use ndarray::Array2;

/// Rectangular pad of in-memory ragged rows to the longest row.
///
/// Returns the padded array and the resulting column count. An input with
/// no rows pads to a `0 x 0` array.
pub fn pad_rows<T: Copy>(rows: &[Vec<T>], fill: T) -> (Array2<T>, usize) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Array2::from_elem((rows.len(), width), fill);
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            out[[i, j]] = v;
        }
    }
    (out, width)
}

/// Rectangular pad of rows with explicit missing cells, applying the
/// trailing-column trim rule: the last column is dropped iff every row's
/// last cell is missing.
pub fn pad_cells<T: Copy>(rows: &[Vec<Option<T>>], fill: T) -> (Array2<T>, usize) {
    let mut width = rows.iter().map(Vec::len).max().unwrap_or(0);

    let last_all_missing = width > 0
        && rows
            .iter()
            .all(|row| row.len() < width || row[width - 1].is_none());
    if last_all_missing {
        width -= 1;
    }

    let mut out = Array2::from_elem((rows.len(), width), fill);
    for (i, row) in rows.iter().enumerate() {
        for (j, cell) in row.iter().take(width).enumerate() {
            if let Some(v) = *cell {
                out[[i, j]] = v;
            }
        }
    }
    (out, width)
}
