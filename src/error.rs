//! Error types for grid planning and format conversion

use std::io;

/// Result type for planning operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Planning and format conversion errors
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The matrix shape does not divide evenly into the PE grid.
    /// Fatal: the caller must pick a compatible grid, never truncate.
    #[error("matrix {n}x{k} does not divide into a {height}x{width} grid")]
    ShapeMismatch {
        n: usize,
        k: usize,
        height: usize,
        width: usize,
    },

    /// An array does not have the expected number of columns
    #[error("array has {got} columns, expected {expected}")]
    ArrayShape { expected: usize, got: usize },

    /// A padded array's declared length disagrees with its row count
    #[error("padded {array} array: {got} rows for {expected} PEs")]
    RowCount {
        array: &'static str,
        expected: usize,
        got: usize,
    },

    /// A structural index decoded from a padded array is out of tile bounds
    #[error("index {index} out of bounds for tile dimension {bound}")]
    IndexOutOfBounds { index: i64, bound: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot parse {what}: {text:?}")]
    Parse { what: &'static str, text: String },
}
