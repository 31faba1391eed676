//! Compressed sparse row (CSR) grid layout
//!
//! Each PE receives its tile as values, local column indices, and a row
//! pointer array of fixed length `Nt + 1`. `row_ptr[i]` counts the
//! nonzeros in tile rows before `i`, so it is monotone with
//! `row_ptr[0] = 0` and `row_ptr[Nt] = nnz_tile`.

use ndarray::{Array2, ArrayView2};
use num_traits::Num;

use crate::constants::INDEX_SENTINEL;
use crate::error::{PlanError, Result};
use crate::grid::GridSpec;

use super::coo::check_local;
use super::dense::check_dims;
use super::padding::pad_rows;
use super::PadFill;

/// Ragged CSR payloads, one row per PE
#[derive(Debug, Clone)]
pub struct GridCsr<T> {
    pub val: Vec<Vec<T>>,
    /// Local column indices
    pub col_idx: Vec<Vec<i32>>,
    /// Row pointers, length `Nt + 1` for every PE
    pub row_ptr: Vec<Vec<i32>>,
    spec: GridSpec,
}

impl<T> GridCsr<T>
where
    T: Copy + Num,
{
    /// Encodes every tile of `a`, preserving column order within rows
    pub fn encode(a: &Array2<T>, spec: &GridSpec) -> Result<Self> {
        check_dims(a, spec)?;
        let mut val = Vec::with_capacity(spec.num_pes());
        let mut col_idx = Vec::with_capacity(spec.num_pes());
        let mut row_ptr = Vec::with_capacity(spec.num_pes());

        for row in 0..spec.height {
            for col in 0..spec.width {
                let tile = spec.tile_view(a, row, col);
                let (tv, tc, tp) = encode_tile(&tile);
                val.push(tv);
                col_idx.push(tc);
                row_ptr.push(tp);
            }
        }
        Ok(Self {
            val,
            col_idx,
            row_ptr,
            spec: *spec,
        })
    }

    /// Pads values and column indices to the grid-wide maximum nonzero
    /// count; pointer rows are already uniform.
    pub fn pad(self, fill: PadFill) -> PaddedCsr<T> {
        let (val, val_len) = pad_rows(&self.val, fill.value());
        let (col_idx, col_len) = pad_rows(&self.col_idx, INDEX_SENTINEL);
        let (row_ptr, ptr_len) = pad_rows(&self.row_ptr, INDEX_SENTINEL);
        PaddedCsr {
            val,
            col_idx,
            row_ptr,
            lengths: vec![val_len, col_len, ptr_len],
            spec: self.spec,
        }
    }
}

fn encode_tile<T: Copy + Num>(tile: &ArrayView2<T>) -> (Vec<T>, Vec<i32>, Vec<i32>) {
    let mut val = Vec::new();
    let mut col_idx = Vec::new();
    let mut row_ptr = Vec::with_capacity(tile.nrows() + 1);
    row_ptr.push(0);
    for row in tile.rows() {
        for (c, &v) in row.indexed_iter() {
            if v != T::zero() {
                val.push(v);
                col_idx.push(c as i32);
            }
        }
        row_ptr.push(val.len() as i32);
    }
    (val, col_idx, row_ptr)
}

/// Transfer-ready CSR record
#[derive(Debug, Clone)]
pub struct PaddedCsr<T> {
    pub val: Array2<T>,
    pub col_idx: Array2<i32>,
    pub row_ptr: Array2<i32>,
    /// Reported column counts, in array-label order:
    /// `[val, col_idx, row_ptr]`
    pub lengths: Vec<usize>,
    spec: GridSpec,
}

impl<T> PaddedCsr<T>
where
    T: Copy + Num,
{
    /// Rebuilds a record from transfer arrays, checking the PE row counts
    /// and the pointer width
    pub fn new(
        val: Array2<T>,
        col_idx: Array2<i32>,
        row_ptr: Array2<i32>,
        spec: GridSpec,
    ) -> Result<Self> {
        for (array, rows) in [
            ("val", val.nrows()),
            ("col_idx", col_idx.nrows()),
            ("row_ptr", row_ptr.nrows()),
        ] {
            if rows != spec.num_pes() {
                return Err(PlanError::RowCount {
                    array,
                    expected: spec.num_pes(),
                    got: rows,
                });
            }
        }
        if row_ptr.ncols() != spec.tile_rows() + 1 {
            return Err(PlanError::ArrayShape {
                expected: spec.tile_rows() + 1,
                got: row_ptr.ncols(),
            });
        }
        let lengths = vec![val.ncols(), col_idx.ncols(), row_ptr.ncols()];
        Ok(Self {
            val,
            col_idx,
            row_ptr,
            lengths,
            spec,
        })
    }

    /// Reassembles the dense matrix; the pointer array decides which
    /// entries are real, so padded tails are never inspected.
    pub fn decode(&self) -> Result<Array2<T>> {
        let nt = self.spec.tile_rows();
        let kt = self.spec.tile_cols();
        let mut a = Array2::zeros((self.spec.n, self.spec.k));
        for pe in 0..self.spec.num_pes() {
            let (tr, tc) = (pe / self.spec.width, pe % self.spec.width);
            let (r0, c0) = self.spec.tile_origin(tr, tc);
            for row in 0..nt {
                let start = check_local(self.row_ptr[[pe, row]], self.val.ncols() + 1)?;
                let end = check_local(self.row_ptr[[pe, row + 1]], self.val.ncols() + 1)?;
                for j in start..end {
                    let col = check_local(self.col_idx[[pe, j]], kt)?;
                    a[[r0 + row, c0 + col]] = self.val[[pe, j]];
                }
            }
        }
        Ok(a)
    }
}
