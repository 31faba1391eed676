//! PE grid geometry and test matrix generation
//!
//! A [`GridSpec`] fixes the partition of an `N x K` matrix onto a
//! `height x width` rectangle of processing elements. Both dimensions must
//! divide exactly; the constructor is the single place this invariant is
//! enforced, so every downstream computation can assume it.

use ndarray::{s, Array2, ArrayView2};
use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::VALUE_RANGE;
use crate::error::{PlanError, Result};

/// Partition of an `n x k` matrix across a `height x width` PE grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    /// Number of matrix rows
    pub n: usize,
    /// Number of matrix columns
    pub k: usize,
    /// Number of PE rows
    pub height: usize,
    /// Number of PE columns
    pub width: usize,
}

impl GridSpec {
    /// Creates a grid specification, checking that the matrix divides
    /// evenly into tiles.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ShapeMismatch`] if any dimension is zero or
    /// `n % height != 0` or `k % width != 0`. The shape is never
    /// silently truncated.
    pub fn new(n: usize, k: usize, height: usize, width: usize) -> Result<Self> {
        let divides = n > 0 && k > 0 && height > 0 && width > 0;
        if !divides || n % height != 0 || k % width != 0 {
            return Err(PlanError::ShapeMismatch {
                n,
                k,
                height,
                width,
            });
        }
        Ok(Self {
            n,
            k,
            height,
            width,
        })
    }

    /// Rows per tile (`Nt = N / height`)
    pub fn tile_rows(&self) -> usize {
        self.n / self.height
    }

    /// Columns per tile (`Kt = K / width`)
    pub fn tile_cols(&self) -> usize {
        self.k / self.width
    }

    /// Total number of PEs (`height * width`)
    pub fn num_pes(&self) -> usize {
        self.height * self.width
    }

    /// Elements per tile (`Nt * Kt`)
    pub fn tile_elems(&self) -> usize {
        self.tile_rows() * self.tile_cols()
    }

    /// Flat PE index of grid coordinate `(row, col)`, row-major over the
    /// grid. This is the host-side row order of every per-PE array.
    pub fn pe_index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    /// Grid coordinate owning global matrix element `(i, j)`
    pub fn tile_of(&self, i: usize, j: usize) -> (usize, usize) {
        (i / self.tile_rows(), j / self.tile_cols())
    }

    /// Top-left global coordinate of tile `(row, col)`
    pub fn tile_origin(&self, row: usize, col: usize) -> (usize, usize) {
        (row * self.tile_rows(), col * self.tile_cols())
    }

    /// View of the submatrix assigned to tile `(row, col)`
    pub fn tile_view<'a, T>(&self, a: &'a Array2<T>, row: usize, col: usize) -> ArrayView2<'a, T> {
        let (r0, c0) = self.tile_origin(row, col);
        a.slice(s![r0..r0 + self.tile_rows(), c0..c0 + self.tile_cols()])
    }
}

/// Generates a random dense `n x k` matrix where each entry is nonzero
/// with probability `density / 100`, independently.
///
/// Entries are drawn uniformly from [`VALUE_RANGE`]. The generator is
/// seeded, so the same `(n, k, density, seed)` always yields the same
/// matrix — measured nnz calibration and tests rely on this.
pub fn generate_dense(n: usize, k: usize, density: f64, seed: u64) -> Array2<f32> {
    let p = (density / 100.0).clamp(0.0, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let val_dist = Uniform::from(VALUE_RANGE.0..VALUE_RANGE.1);

    Array2::from_shape_fn((n, k), |_| {
        if rng.gen_bool(p) {
            val_dist.sample(&mut rng)
        } else {
            0.0
        }
    })
}

/// Number of nonzeros in each tile, row-major over the grid
pub fn tile_nnz_counts<T: Copy + num_traits::Num>(a: &Array2<T>, spec: &GridSpec) -> Vec<usize> {
    let mut counts = Vec::with_capacity(spec.num_pes());
    for row in 0..spec.height {
        for col in 0..spec.width {
            let tile = spec.tile_view(a, row, col);
            counts.push(tile.iter().filter(|&&v| v != T::zero()).count());
        }
    }
    counts
}
