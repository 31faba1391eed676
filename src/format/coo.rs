//! Coordinate (COO) grid layout
//!
//! Each PE receives three parallel arrays: nonzero values plus their
//! local column (`x`) and row (`y`) indices inside the tile. Natural
//! lengths vary per tile with the tile's nonzero count.

use ndarray::{Array2, ArrayView2};
use num_traits::Num;

use crate::constants::INDEX_SENTINEL;
use crate::error::{PlanError, Result};
use crate::grid::GridSpec;

use super::dense::check_dims;
use super::padding::pad_rows;
use super::PadFill;

/// Ragged COO payloads, one row per PE
#[derive(Debug, Clone)]
pub struct GridCoo<T> {
    pub val: Vec<Vec<T>>,
    /// Local column indices
    pub x: Vec<Vec<i32>>,
    /// Local row indices
    pub y: Vec<Vec<i32>>,
    spec: GridSpec,
}

impl<T> GridCoo<T>
where
    T: Copy + Num,
{
    /// Encodes every tile of `a`, scanning row-major within each tile
    pub fn encode(a: &Array2<T>, spec: &GridSpec) -> Result<Self> {
        check_dims(a, spec)?;
        let mut val = Vec::with_capacity(spec.num_pes());
        let mut x = Vec::with_capacity(spec.num_pes());
        let mut y = Vec::with_capacity(spec.num_pes());

        for row in 0..spec.height {
            for col in 0..spec.width {
                let tile = spec.tile_view(a, row, col);
                let (tv, tx, ty) = encode_tile(&tile);
                val.push(tv);
                x.push(tx);
                y.push(ty);
            }
        }
        Ok(Self {
            val,
            x,
            y,
            spec: *spec,
        })
    }

    /// Pads all three arrays to the grid-wide maximum nonzero count
    pub fn pad(self, fill: PadFill) -> PaddedCoo<T> {
        let (val, val_len) = pad_rows(&self.val, fill.value());
        let (x, x_len) = pad_rows(&self.x, INDEX_SENTINEL);
        let (y, y_len) = pad_rows(&self.y, INDEX_SENTINEL);
        PaddedCoo {
            val,
            x,
            y,
            lengths: vec![val_len, x_len, y_len],
            spec: self.spec,
        }
    }
}

fn encode_tile<T: Copy + Num>(tile: &ArrayView2<T>) -> (Vec<T>, Vec<i32>, Vec<i32>) {
    let mut val = Vec::new();
    let mut x = Vec::new();
    let mut y = Vec::new();
    for ((r, c), &v) in tile.indexed_iter() {
        if v != T::zero() {
            val.push(v);
            x.push(c as i32);
            y.push(r as i32);
        }
    }
    (val, x, y)
}

/// Transfer-ready COO record
#[derive(Debug, Clone)]
pub struct PaddedCoo<T> {
    pub val: Array2<T>,
    pub x: Array2<i32>,
    pub y: Array2<i32>,
    /// Reported column counts, in array-label order: `[val, x, y]`
    pub lengths: Vec<usize>,
    spec: GridSpec,
}

impl<T> PaddedCoo<T>
where
    T: Copy + Num,
{
    /// Rebuilds a record from transfer arrays, checking the PE row counts
    pub fn new(val: Array2<T>, x: Array2<i32>, y: Array2<i32>, spec: GridSpec) -> Result<Self> {
        for (array, rows) in [("val", val.nrows()), ("x", x.nrows()), ("y", y.nrows())] {
            if rows != spec.num_pes() {
                return Err(PlanError::RowCount {
                    array,
                    expected: spec.num_pes(),
                    got: rows,
                });
            }
        }
        let lengths = vec![val.ncols(), x.ncols(), y.ncols()];
        Ok(Self {
            val,
            x,
            y,
            lengths,
            spec,
        })
    }

    /// Reassembles the dense matrix, ignoring sentinel-padded entries
    pub fn decode(&self) -> Result<Array2<T>> {
        let mut a = Array2::zeros((self.spec.n, self.spec.k));
        for pe in 0..self.spec.num_pes() {
            let (tr, tc) = (pe / self.spec.width, pe % self.spec.width);
            let (r0, c0) = self.spec.tile_origin(tr, tc);
            for j in 0..self.x.ncols() {
                let cx = self.x[[pe, j]];
                let cy = self.y[[pe, j]];
                if cx == INDEX_SENTINEL && cy == INDEX_SENTINEL {
                    continue;
                }
                let row = check_local(cy, self.spec.tile_rows())?;
                let col = check_local(cx, self.spec.tile_cols())?;
                a[[r0 + row, c0 + col]] = self.val[[pe, j]];
            }
        }
        Ok(a)
    }
}

pub(super) fn check_local(idx: i32, bound: usize) -> Result<usize> {
    if idx < 0 || idx as usize >= bound {
        return Err(PlanError::IndexOutOfBounds {
            index: i64::from(idx),
            bound,
        });
    }
    Ok(idx as usize)
}

/// Packs `(val, x, y)` rows into 48-bit transfer words, keeping the upper
/// 16 bits of each f32.
///
/// The substrate moves 16-bit wavelets; three truncated floats share one
/// 48-bit word. The input must have exactly 3 columns.
pub fn pack_triples(rows: &Array2<f32>) -> Result<Vec<u64>> {
    if rows.ncols() != 3 {
        return Err(PlanError::ArrayShape {
            expected: 3,
            got: rows.ncols(),
        });
    }
    Ok(rows
        .rows()
        .into_iter()
        .map(|r| {
            let hi = |f: f32| u64::from(f.to_bits() >> 16);
            (hi(r[0]) << 32) | (hi(r[1]) << 16) | hi(r[2])
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::generate_dense;
    use ndarray::array;

    #[test]
    fn test_roundtrip() {
        let spec = GridSpec::new(8, 8, 2, 2).unwrap();
        let a = generate_dense(8, 8, 30.0, 5);
        let padded = GridCoo::encode(&a, &spec).unwrap().pad(PadFill::NegOne);
        assert_eq!(padded.decode().unwrap(), a);
    }

    #[test]
    fn test_lengths_are_grid_max() {
        let spec = GridSpec::new(4, 4, 2, 2).unwrap();
        // One nonzero in the first tile, three in the last.
        let a = array![
            [1.0f32, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 3.0],
            [0.0, 0.0, 4.0, 0.0],
        ];
        let padded = GridCoo::encode(&a, &spec).unwrap().pad(PadFill::NegOne);
        assert_eq!(padded.lengths, vec![3, 3, 3]);
        // Empty tiles are all sentinel.
        assert_eq!(padded.x.row(1).to_vec(), vec![-1, -1, -1]);
        assert_eq!(padded.decode().unwrap(), a);
    }

    #[test]
    fn test_negative_one_value_roundtrips() {
        // A legitimate value of -1.0 must survive value-sentinel padding.
        let spec = GridSpec::new(2, 2, 1, 1).unwrap();
        let a = array![[-1.0f32, 0.0], [0.0, 0.0]];
        let padded = GridCoo::encode(&a, &spec).unwrap().pad(PadFill::NegOne);
        assert_eq!(padded.decode().unwrap(), a);
    }

    #[test]
    fn test_pack_triples_shape_check() {
        let bad = Array2::<f32>::zeros((2, 4));
        assert!(matches!(
            pack_triples(&bad),
            Err(PlanError::ArrayShape { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn test_pack_triples_bits() {
        let rows = array![[1.0f32, 2.0, 3.0]];
        let packed = pack_triples(&rows).unwrap();
        let hi = |f: f32| u64::from(f.to_bits() >> 16);
        assert_eq!(packed, vec![(hi(1.0) << 32) | (hi(2.0) << 16) | hi(3.0)]);
    }
}
