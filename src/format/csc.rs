//! Compressed sparse column (CSC) grid layout
//!
//! The column-major dual of CSR: values, local row indices, and a column
//! pointer array of fixed length `Kt + 1` per PE.

use ndarray::{Array2, ArrayView2};
use num_traits::Num;

use crate::constants::INDEX_SENTINEL;
use crate::error::{PlanError, Result};
use crate::grid::GridSpec;

use super::coo::check_local;
use super::dense::check_dims;
use super::padding::pad_rows;
use super::PadFill;

/// Ragged CSC payloads, one row per PE
#[derive(Debug, Clone)]
pub struct GridCsc<T> {
    pub val: Vec<Vec<T>>,
    /// Local row indices
    pub row_idx: Vec<Vec<i32>>,
    /// Column pointers, length `Kt + 1` for every PE
    pub col_ptr: Vec<Vec<i32>>,
    spec: GridSpec,
}

impl<T> GridCsc<T>
where
    T: Copy + Num,
{
    /// Encodes every tile of `a`, preserving row order within columns
    pub fn encode(a: &Array2<T>, spec: &GridSpec) -> Result<Self> {
        check_dims(a, spec)?;
        let mut val = Vec::with_capacity(spec.num_pes());
        let mut row_idx = Vec::with_capacity(spec.num_pes());
        let mut col_ptr = Vec::with_capacity(spec.num_pes());

        for row in 0..spec.height {
            for col in 0..spec.width {
                let tile = spec.tile_view(a, row, col);
                let (tv, tr, tp) = encode_tile(&tile);
                val.push(tv);
                row_idx.push(tr);
                col_ptr.push(tp);
            }
        }
        Ok(Self {
            val,
            row_idx,
            col_ptr,
            spec: *spec,
        })
    }

    /// Pads values and row indices to the grid-wide maximum nonzero
    /// count; pointer rows are already uniform.
    pub fn pad(self, fill: PadFill) -> PaddedCsc<T> {
        let (val, val_len) = pad_rows(&self.val, fill.value());
        let (row_idx, row_len) = pad_rows(&self.row_idx, INDEX_SENTINEL);
        let (col_ptr, ptr_len) = pad_rows(&self.col_ptr, INDEX_SENTINEL);
        PaddedCsc {
            val,
            row_idx,
            col_ptr,
            lengths: vec![val_len, row_len, ptr_len],
            spec: self.spec,
        }
    }
}

fn encode_tile<T: Copy + Num>(tile: &ArrayView2<T>) -> (Vec<T>, Vec<i32>, Vec<i32>) {
    let mut val = Vec::new();
    let mut row_idx = Vec::new();
    let mut col_ptr = Vec::with_capacity(tile.ncols() + 1);
    col_ptr.push(0);
    for col in tile.columns() {
        for (r, &v) in col.indexed_iter() {
            if v != T::zero() {
                val.push(v);
                row_idx.push(r as i32);
            }
        }
        col_ptr.push(val.len() as i32);
    }
    (val, row_idx, col_ptr)
}

/// Transfer-ready CSC record
#[derive(Debug, Clone)]
pub struct PaddedCsc<T> {
    pub val: Array2<T>,
    pub row_idx: Array2<i32>,
    pub col_ptr: Array2<i32>,
    /// Reported column counts, in array-label order:
    /// `[val, row_idx, col_ptr]`
    pub lengths: Vec<usize>,
    spec: GridSpec,
}

impl<T> PaddedCsc<T>
where
    T: Copy + Num,
{
    /// Rebuilds a record from transfer arrays, checking the PE row counts
    /// and the pointer width
    pub fn new(
        val: Array2<T>,
        row_idx: Array2<i32>,
        col_ptr: Array2<i32>,
        spec: GridSpec,
    ) -> Result<Self> {
        for (array, rows) in [
            ("val", val.nrows()),
            ("row_idx", row_idx.nrows()),
            ("col_ptr", col_ptr.nrows()),
        ] {
            if rows != spec.num_pes() {
                return Err(PlanError::RowCount {
                    array,
                    expected: spec.num_pes(),
                    got: rows,
                });
            }
        }
        if col_ptr.ncols() != spec.tile_cols() + 1 {
            return Err(PlanError::ArrayShape {
                expected: spec.tile_cols() + 1,
                got: col_ptr.ncols(),
            });
        }
        let lengths = vec![val.ncols(), row_idx.ncols(), col_ptr.ncols()];
        Ok(Self {
            val,
            row_idx,
            col_ptr,
            lengths,
            spec,
        })
    }

    /// Reassembles the dense matrix from pointer counts
    pub fn decode(&self) -> Result<Array2<T>> {
        let nt = self.spec.tile_rows();
        let kt = self.spec.tile_cols();
        let mut a = Array2::zeros((self.spec.n, self.spec.k));
        for pe in 0..self.spec.num_pes() {
            let (tr, tc) = (pe / self.spec.width, pe % self.spec.width);
            let (r0, c0) = self.spec.tile_origin(tr, tc);
            for col in 0..kt {
                let start = check_local(self.col_ptr[[pe, col]], self.val.ncols() + 1)?;
                let end = check_local(self.col_ptr[[pe, col + 1]], self.val.ncols() + 1)?;
                for j in start..end {
                    let row = check_local(self.row_idx[[pe, j]], nt)?;
                    a[[r0 + row, c0 + col]] = self.val[[pe, j]];
                }
            }
        }
        Ok(a)
    }
}
