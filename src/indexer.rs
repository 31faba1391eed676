//! Affine index maps between host arrays and PE-local storage
//!
//! Transfers between the host and the grid move rectangular arrays whose
//! rows are distributed over PEs. The maps here decide which host element
//! lands on which PE at which local offset, and the inverses reassemble
//! host data from per-PE buffers. They are pure total functions over their
//! index ranges; the textual port-map notation consumed by external tools
//! is generated elsewhere from these same maps.
//!
//! Conventions, fixed by the execution substrate:
//! - Per-PE A arrays are laid out one host row per PE, row-major over the
//!   grid (ELLPACK uses `Nt` host rows per PE).
//! - The B operand enters at grid row 0 of its column group and is
//!   broadcast southward by the substrate (not modeled here).
//! - Results are gathered from the last PE column, where the eastward
//!   reduction terminates.

use crate::grid::GridSpec;
use crate::memory::padded_m;

/// A PE position: `x` is the grid column, `y` the grid row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeCoord {
    pub x: usize,
    pub y: usize,
}

/// Index maps for one grid layout and output width
#[derive(Debug, Clone, Copy)]
pub struct TileIndexer {
    spec: GridSpec,
    /// Output width after alignment padding; the maps assume the operand
    /// and result arrays already carry this width
    pub padded_m: usize,
}

impl TileIndexer {
    /// Builds the index maps for `spec` with free output dimension `m`.
    ///
    /// `m` is padded to the substrate's access granularity here, so the
    /// caller supplies the logical width. Shape validation already
    /// happened when `spec` was constructed.
    pub fn new(spec: GridSpec, m: usize) -> Self {
        Self {
            spec,
            padded_m: padded_m(m),
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Destination PE of host row `i` of a flat per-PE array
    /// (dense / COO / CSR / CSC payloads: one row per PE).
    pub fn a_row_pe(&self, i: usize) -> PeCoord {
        assert!(i < self.spec.num_pes(), "host row out of range");
        PeCoord {
            x: i % self.spec.width,
            y: i / self.spec.width,
        }
    }

    /// Host row holding the flat per-PE array of `pe` (inverse of
    /// [`Self::a_row_pe`])
    pub fn a_row_of(&self, pe: PeCoord) -> usize {
        pe.y * self.spec.width + pe.x
    }

    /// Destination of host row `i` of an ELLPACK payload (`Nt` host rows
    /// per PE): the PE plus the local row within its tile.
    pub fn a_ellpack_pe(&self, i: usize) -> (PeCoord, usize) {
        let nt = self.spec.tile_rows();
        assert!(i < self.spec.num_pes() * nt, "host row out of range");
        let pe = PeCoord {
            x: (i / nt) % self.spec.width,
            y: i / (nt * self.spec.width),
        };
        (pe, i % nt)
    }

    /// Host row holding local row `local` of `pe`'s ELLPACK payload
    /// (inverse of [`Self::a_ellpack_pe`])
    pub fn a_ellpack_row_of(&self, pe: PeCoord, local: usize) -> usize {
        let nt = self.spec.tile_rows();
        (pe.y * self.spec.width + pe.x) * nt + local
    }

    /// Entry PE and local coordinate of element `(i, j)` of the
    /// `K x padded_M` operand.
    ///
    /// Row blocks of `Kt` land on grid row 0 of their column group; the
    /// substrate broadcasts them south.
    pub fn b_entry(&self, i: usize, j: usize) -> (PeCoord, (usize, usize)) {
        let kt = self.spec.tile_cols();
        assert!(i < self.spec.k, "operand row out of range");
        assert!(j < self.padded_m, "operand column out of range");
        (PeCoord { x: i / kt, y: 0 }, (i % kt, j))
    }

    /// Operand element held at local `(row, col)` of entry PE `pe`
    /// (inverse of [`Self::b_entry`])
    pub fn b_global(&self, pe: PeCoord, row: usize, col: usize) -> (usize, usize) {
        (pe.x * self.spec.tile_cols() + row, col)
    }

    /// Source PE and local offset of flat result index
    /// `n ∈ [0, N*padded_M)`.
    ///
    /// Result rows of grid row `r` sit in the last PE column where the
    /// eastward partial-sum reduction ends; the local offset is
    /// `row_within_tile * padded_M + col`.
    pub fn c_source(&self, n: usize) -> (PeCoord, usize) {
        let per_pe = self.spec.tile_rows() * self.padded_m;
        assert!(n < self.spec.n * self.padded_m, "result index out of range");
        (
            PeCoord {
                x: self.spec.width - 1,
                y: n / per_pe,
            },
            n % per_pe,
        )
    }

    /// Flat result index held at `offset` of gather PE `pe` (inverse of
    /// [`Self::c_source`])
    pub fn c_global(&self, pe: PeCoord, offset: usize) -> usize {
        pe.y * self.spec.tile_rows() * self.padded_m + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> TileIndexer {
        let spec = GridSpec::new(6, 4, 3, 2).unwrap();
        TileIndexer::new(spec, 8)
    }

    #[test]
    fn test_a_rows_cover_grid() {
        let ix = indexer();
        // Row-major over the grid: x varies fastest.
        assert_eq!(ix.a_row_pe(0), PeCoord { x: 0, y: 0 });
        assert_eq!(ix.a_row_pe(1), PeCoord { x: 1, y: 0 });
        assert_eq!(ix.a_row_pe(2), PeCoord { x: 0, y: 1 });
        assert_eq!(ix.a_row_pe(5), PeCoord { x: 1, y: 2 });
    }

    #[test]
    fn test_a_row_inverse() {
        let ix = indexer();
        for i in 0..ix.spec().num_pes() {
            assert_eq!(ix.a_row_of(ix.a_row_pe(i)), i);
        }
    }

    #[test]
    fn test_ellpack_inverse() {
        let ix = indexer();
        let nt = ix.spec().tile_rows();
        for i in 0..ix.spec().num_pes() * nt {
            let (pe, local) = ix.a_ellpack_pe(i);
            assert_eq!(ix.a_ellpack_row_of(pe, local), i);
        }
    }

    #[test]
    fn test_b_lands_on_first_grid_row() {
        let ix = indexer();
        for i in 0..ix.spec().k {
            for j in 0..ix.padded_m {
                let (pe, (row, col)) = ix.b_entry(i, j);
                assert_eq!(pe.y, 0);
                assert!(pe.x < ix.spec().width);
                assert_eq!(ix.b_global(pe, row, col), (i, j));
            }
        }
    }

    #[test]
    fn test_c_gathers_from_last_column() {
        let ix = indexer();
        for n in 0..ix.spec().n * ix.padded_m {
            let (pe, offset) = ix.c_source(n);
            assert_eq!(pe.x, ix.spec().width - 1);
            assert_eq!(ix.c_global(pe, offset), n);
        }
    }

    #[test]
    fn test_padded_width_applied() {
        // M = 8 pads to 12 (multiple of 4, one reserved column).
        assert_eq!(indexer().padded_m, 12);
    }

    #[test]
    #[should_panic(expected = "host row out of range")]
    fn test_a_row_out_of_range() {
        let ix = indexer();
        ix.a_row_pe(ix.spec().num_pes());
    }
}
