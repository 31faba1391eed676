//! ELLPACK-style grid layout
//!
//! Storage is one host row per *tile row*: `num_PE * Nt` rows of values
//! and matching local column indices, each ragged at the tile row's
//! nonzero count. The padding pass brings every row to the grid-wide
//! worst row, so a PE's payload is `Nt x max_nnz_per_row` for each array.

use ndarray::{Array2, ArrayView2};
use num_traits::Num;

use crate::constants::INDEX_SENTINEL;
use crate::error::{PlanError, Result};
use crate::grid::GridSpec;

use super::coo::check_local;
use super::dense::check_dims;
use super::padding::pad_rows;
use super::PadFill;

/// Ragged ELLPACK payloads, `Nt` rows per PE
#[derive(Debug, Clone)]
pub struct GridEllpack<T> {
    pub val: Vec<Vec<T>>,
    /// Local column indices per tile row
    pub indices: Vec<Vec<i32>>,
    spec: GridSpec,
}

impl<T> GridEllpack<T>
where
    T: Copy + Num,
{
    /// Encodes every tile of `a`, one storage row per tile row
    pub fn encode(a: &Array2<T>, spec: &GridSpec) -> Result<Self> {
        check_dims(a, spec)?;
        let rows = spec.num_pes() * spec.tile_rows();
        let mut val = Vec::with_capacity(rows);
        let mut indices = Vec::with_capacity(rows);

        for row in 0..spec.height {
            for col in 0..spec.width {
                let tile = spec.tile_view(a, row, col);
                encode_tile(&tile, &mut val, &mut indices);
            }
        }
        Ok(Self {
            val,
            indices,
            spec: *spec,
        })
    }

    /// Pads every storage row to the grid-wide worst-row nonzero count
    pub fn pad(self, fill: PadFill) -> PaddedEllpack<T> {
        let (val, val_len) = pad_rows(&self.val, fill.value());
        let (indices, idx_len) = pad_rows(&self.indices, INDEX_SENTINEL);
        PaddedEllpack {
            val,
            indices,
            lengths: vec![val_len, idx_len],
            spec: self.spec,
        }
    }
}

fn encode_tile<T: Copy + Num>(
    tile: &ArrayView2<T>,
    val: &mut Vec<Vec<T>>,
    indices: &mut Vec<Vec<i32>>,
) {
    for row in tile.rows() {
        let mut rv = Vec::new();
        let mut ri = Vec::new();
        for (c, &v) in row.indexed_iter() {
            if v != T::zero() {
                rv.push(v);
                ri.push(c as i32);
            }
        }
        val.push(rv);
        indices.push(ri);
    }
}

/// Transfer-ready ELLPACK record
#[derive(Debug, Clone)]
pub struct PaddedEllpack<T> {
    pub val: Array2<T>,
    pub indices: Array2<i32>,
    /// Reported column counts, in array-label order: `[val, indices]`
    pub lengths: Vec<usize>,
    spec: GridSpec,
}

impl<T> PaddedEllpack<T>
where
    T: Copy + Num,
{
    /// Rebuilds a record from transfer arrays, checking the row count
    /// (`num_PE * Nt`)
    pub fn new(val: Array2<T>, indices: Array2<i32>, spec: GridSpec) -> Result<Self> {
        let expected = spec.num_pes() * spec.tile_rows();
        for (array, rows) in [("val", val.nrows()), ("indices", indices.nrows())] {
            if rows != expected {
                return Err(PlanError::RowCount {
                    array,
                    expected,
                    got: rows,
                });
            }
        }
        let lengths = vec![val.ncols(), indices.ncols()];
        Ok(Self {
            val,
            indices,
            lengths,
            spec,
        })
    }

    /// Reassembles the dense matrix, ignoring sentinel-padded entries
    pub fn decode(&self) -> Result<Array2<T>> {
        let nt = self.spec.tile_rows();
        let kt = self.spec.tile_cols();
        let mut a = Array2::zeros((self.spec.n, self.spec.k));
        for storage_row in 0..self.val.nrows() {
            let pe = storage_row / nt;
            let local_row = storage_row % nt;
            let (tr, tc) = (pe / self.spec.width, pe % self.spec.width);
            let (r0, c0) = self.spec.tile_origin(tr, tc);
            for j in 0..self.indices.ncols() {
                let idx = self.indices[[storage_row, j]];
                if idx == INDEX_SENTINEL {
                    continue;
                }
                let col = check_local(idx, kt)?;
                a[[r0 + local_row, c0 + col]] = self.val[[storage_row, j]];
            }
        }
        Ok(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::generate_dense;
    use ndarray::array;

    #[test]
    fn test_roundtrip() {
        let spec = GridSpec::new(8, 8, 2, 2).unwrap();
        let a = generate_dense(8, 8, 45.0, 31);
        let padded = GridEllpack::encode(&a, &spec).unwrap().pad(PadFill::NegOne);
        assert_eq!(padded.decode().unwrap(), a);
    }

    #[test]
    fn test_width_is_worst_row() {
        let spec = GridSpec::new(4, 4, 2, 2).unwrap();
        let a = array![
            [1.0f32, 2.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 3.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ];
        let padded = GridEllpack::encode(&a, &spec).unwrap().pad(PadFill::NegOne);
        // Worst tile row holds two nonzeros.
        assert_eq!(padded.lengths, vec![2, 2]);
        assert_eq!(padded.val.nrows(), spec.num_pes() * spec.tile_rows());
        assert_eq!(padded.decode().unwrap(), a);
    }

    #[test]
    fn test_storage_row_order_matches_port_map() {
        use crate::indexer::TileIndexer;
        let spec = GridSpec::new(4, 4, 2, 2).unwrap();
        let a = generate_dense(4, 4, 60.0, 37);
        let enc = GridEllpack::encode(&a, &spec).unwrap();
        let ix = TileIndexer::new(spec, 8);
        // Host row i must describe local row `i % Nt` of the PE the
        // indexer routes it to.
        for i in 0..enc.val.len() {
            let (pe, local) = ix.a_ellpack_pe(i);
            let pe_index = spec.pe_index(pe.y, pe.x);
            assert_eq!(pe_index * spec.tile_rows() + local, i);
        }
    }
}
