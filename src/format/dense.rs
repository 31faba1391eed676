//! Dense (GEMM) grid layout: each PE receives its full tile row-major

use ndarray::Array2;
use num_traits::Num;

use crate::error::{PlanError, Result};
use crate::grid::GridSpec;

use super::PadFill;

/// Dense tile payloads, one row of `Nt*Kt` values per PE
#[derive(Debug, Clone)]
pub struct GridDense<T> {
    /// Tile values, row-major within the tile (size: num_PE x Nt*Kt)
    pub val: Vec<Vec<T>>,
    spec: GridSpec,
}

impl<T> GridDense<T>
where
    T: Copy + Num,
{
    /// Encodes every tile of `a` under `spec`
    pub fn encode(a: &Array2<T>, spec: &GridSpec) -> Result<Self> {
        check_dims(a, spec)?;
        let mut val = Vec::with_capacity(spec.num_pes());
        for row in 0..spec.height {
            for col in 0..spec.width {
                let tile = spec.tile_view(a, row, col);
                val.push(tile.iter().copied().collect());
            }
        }
        Ok(Self { val, spec: *spec })
    }

    /// Dense rows are already uniform; the padding pass is a no-op that
    /// reports the fixed length `Nt*Kt`.
    pub fn pad(self, _fill: PadFill) -> PaddedDense<T> {
        let rows = self.val.len();
        let width = self.spec.tile_elems();
        let mut val = Array2::zeros((rows, width));
        for (i, row) in self.val.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                val[[i, j]] = v;
            }
        }
        PaddedDense {
            val,
            lengths: vec![width],
            spec: self.spec,
        }
    }
}

/// Transfer-ready dense record
#[derive(Debug, Clone)]
pub struct PaddedDense<T> {
    pub val: Array2<T>,
    /// Reported column counts, in array-label order: `[val]`
    pub lengths: Vec<usize>,
    spec: GridSpec,
}

impl<T> PaddedDense<T>
where
    T: Copy + Num,
{
    /// Rebuilds a record from transfer arrays, checking the PE row count
    pub fn new(val: Array2<T>, spec: GridSpec) -> Result<Self> {
        if val.nrows() != spec.num_pes() {
            return Err(PlanError::RowCount {
                array: "val",
                expected: spec.num_pes(),
                got: val.nrows(),
            });
        }
        if val.ncols() != spec.tile_elems() {
            return Err(PlanError::ArrayShape {
                expected: spec.tile_elems(),
                got: val.ncols(),
            });
        }
        let lengths = vec![val.ncols()];
        Ok(Self { val, lengths, spec })
    }

    /// Reassembles the dense `N x K` matrix
    pub fn decode(&self) -> Result<Array2<T>> {
        let kt = self.spec.tile_cols();
        let mut a = Array2::zeros((self.spec.n, self.spec.k));
        for pe in 0..self.spec.num_pes() {
            let (tr, tc) = (pe / self.spec.width, pe % self.spec.width);
            let (r0, c0) = self.spec.tile_origin(tr, tc);
            for local in 0..self.spec.tile_elems() {
                a[[r0 + local / kt, c0 + local % kt]] = self.val[[pe, local]];
            }
        }
        Ok(a)
    }
}

pub(super) fn check_dims<T>(a: &Array2<T>, spec: &GridSpec) -> Result<()> {
    if a.nrows() != spec.n || a.ncols() != spec.k {
        return Err(PlanError::ShapeMismatch {
            n: a.nrows(),
            k: a.ncols(),
            height: spec.height,
            width: spec.width,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::generate_dense;

    #[test]
    fn test_roundtrip() {
        let spec = GridSpec::new(6, 6, 2, 3).unwrap();
        let a = generate_dense(6, 6, 50.0, 3);
        let padded = GridDense::encode(&a, &spec).unwrap().pad(PadFill::NegOne);
        assert_eq!(padded.lengths, vec![6]);
        assert_eq!(padded.decode().unwrap(), a);
    }

    #[test]
    fn test_rejects_wrong_matrix_shape() {
        let spec = GridSpec::new(6, 6, 2, 3).unwrap();
        let a = Array2::<f32>::zeros((4, 6));
        assert!(GridDense::encode(&a, &spec).is_err());
    }

    #[test]
    fn test_integer_values() {
        // The payload type follows the caller; index-typed matrices
        // encode the same way.
        let spec = GridSpec::new(2, 2, 1, 1).unwrap();
        let a = ndarray::array![[1i64, 0], [0, 7]];
        let padded = GridDense::encode(&a, &spec).unwrap().pad(PadFill::Zero);
        assert_eq!(padded.decode().unwrap(), a);
    }
}
