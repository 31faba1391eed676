//! Per-PE memory accounting
//!
//! Every format stores three things on a PE: its slice of the B operand
//! (`Kt x padded_M`), its slice of the result C (`Nt x padded_M`), and the
//! structural arrays of its A tile. Operand and result widths are padded to
//! the access-pattern alignment with one extra column reserved to break a
//! bank-conflict pattern; the structural term is what distinguishes the
//! formats. Remaining runtime buffers are accounted for in the reserved
//! budget, not here.

use crate::constants::{ALIGN_BYTES, ELEMENT_BYTES, ESTIMATE_HEADROOM};
use crate::estimator::NnzBound;
use crate::format::GridFormat;

/// Output width after alignment: `M+1` rounded up to the element multiple
/// of the default 16-byte alignment.
pub fn padded_m(m: usize) -> usize {
    padded_m_with(m, ALIGN_BYTES, ELEMENT_BYTES)
}

/// [`padded_m`] with explicit alignment and element size in bytes.
///
/// The `+1` reserves one extra column and must be preserved even when `M`
/// is already aligned.
pub fn padded_m_with(m: usize, align_bytes: usize, element_bytes: usize) -> usize {
    let multiple = align_bytes / element_bytes;
    (m + 1).div_ceil(multiple) * multiple
}

/// Per-PE byte model for one grid format
///
/// Pure functions of the tile shape; the nonzero bound comes from the
/// shared estimator (statistical path) or from measured encoder lengths
/// (exact path).
#[derive(Debug)]
pub struct MemoryModel<'a> {
    bounds: &'a NnzBound,
}

impl<'a> MemoryModel<'a> {
    pub fn new(bounds: &'a NnzBound) -> Self {
        Self { bounds }
    }

    /// Total bytes used per PE, with the structural term taken from the
    /// statistical nonzero bound.
    ///
    /// Monotone non-decreasing in `nt`, `kt`, `m` and `density`.
    pub fn bytes_per_pe(
        &self,
        format: GridFormat,
        nt: usize,
        kt: usize,
        m: usize,
        density: f64,
        width: usize,
        height: usize,
    ) -> usize {
        let structural = self.structural_elems(format, nt, kt, density, width * height);
        Self::total_bytes(nt, kt, m, structural)
    }

    /// Total bytes used per PE from measured padded array lengths, the
    /// authoritative figure once an actual instance has been encoded.
    ///
    /// `lengths` is the padding pass report in the format's array order;
    /// ELLPACK lengths are per host row and count `nt` rows per PE.
    pub fn bytes_per_pe_measured(
        &self,
        format: GridFormat,
        lengths: &[usize],
        nt: usize,
        kt: usize,
        m: usize,
    ) -> usize {
        let per_pe: usize = lengths.iter().sum();
        let structural = match format {
            GridFormat::Ellpack => nt * per_pe,
            _ => per_pe,
        };
        Self::total_bytes(nt, kt, m, structural)
    }

    /// Cheap admission check and exact fallback.
    ///
    /// A fast estimate (expected nonzeros plus headroom) rejects
    /// configurations that cannot fit without paying for an exact
    /// measurement. Only when the estimate fits is `measure` invoked for
    /// the worst-tile nonzero count (worst-row for ELLPACK); measurement
    /// is fallible (it may wrap an external generator) and falls back to
    /// the statistical bound.
    pub fn bytes_per_pe_admitted(
        &self,
        format: GridFormat,
        nt: usize,
        kt: usize,
        m: usize,
        density: f64,
        width: usize,
        height: usize,
        budget: usize,
        measure: impl FnOnce() -> Option<usize>,
    ) -> usize {
        // Expected nonzeros per tile, or per tile row for ELLPACK whose
        // structural term is row-based.
        let expected = match format {
            GridFormat::Ellpack => kt as f64 * (density / 100.0),
            _ => nt as f64 * kt as f64 * (density / 100.0),
        };
        let quick_nnz = (expected * ESTIMATE_HEADROOM).ceil() as usize;
        let estimate = Self::total_bytes(nt, kt, m, Self::format_elems(format, nt, kt, quick_nnz));
        if estimate > budget {
            return estimate;
        }

        let nnz = measure()
            .unwrap_or_else(|| self.structural_nnz(format, nt, kt, density, width * height));
        Self::total_bytes(nt, kt, m, Self::format_elems(format, nt, kt, nnz))
    }

    /// Per-PE structural array lengths implied by the statistical bound,
    /// in the format's array-label order (ELLPACK lengths are per host
    /// row)
    pub fn array_lengths(
        &self,
        format: GridFormat,
        nt: usize,
        kt: usize,
        density: f64,
        trials: usize,
    ) -> Vec<usize> {
        let k = self.structural_nnz(format, nt, kt, density, trials);
        match format {
            GridFormat::Gemm => vec![nt * kt],
            GridFormat::Coo => vec![k, k, k],
            GridFormat::Csr => vec![k, k, nt + 1],
            GridFormat::Csc => vec![k, k, kt + 1],
            GridFormat::Ellpack => vec![k, k],
        }
    }

    /// Structural element count for `format` using the statistical bound
    fn structural_elems(
        &self,
        format: GridFormat,
        nt: usize,
        kt: usize,
        density: f64,
        trials: usize,
    ) -> usize {
        let k = self.structural_nnz(format, nt, kt, density, trials);
        Self::format_elems(format, nt, kt, k)
    }

    /// The bound the structural term is based on: whole-tile nonzeros for
    /// the flat formats, worst-row nonzeros for ELLPACK (each of the
    /// `trials * nt` rows must satisfy it simultaneously).
    fn structural_nnz(
        &self,
        format: GridFormat,
        nt: usize,
        kt: usize,
        density: f64,
        trials: usize,
    ) -> usize {
        match format {
            GridFormat::Gemm => nt * kt,
            GridFormat::Ellpack => self.bounds.upper_bound(1, kt, density, trials * nt),
            _ => self.bounds.upper_bound(nt, kt, density, trials),
        }
    }

    /// Structural element count given a nonzero figure `k` (per tile, or
    /// per row for ELLPACK)
    fn format_elems(format: GridFormat, nt: usize, kt: usize, k: usize) -> usize {
        match format {
            GridFormat::Gemm => nt * kt,
            GridFormat::Coo => 3 * k,
            GridFormat::Csr => k + k + (nt + 1),
            GridFormat::Csc => k + k + (kt + 1),
            GridFormat::Ellpack => 2 * nt * k,
        }
    }

    /// `4 * (mem_B + mem_C + structural)` element counts to bytes
    fn total_bytes(nt: usize, kt: usize, m: usize, structural: usize) -> usize {
        let pm = padded_m(m);
        let mem_b = kt * pm;
        let mem_c = nt * pm;
        ELEMENT_BYTES * (mem_b + mem_c + structural)
    }
}
