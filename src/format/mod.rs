//! Grid storage formats
//!
//! Each format encodes the per-tile sparse content of a matrix into a
//! small set of host arrays with one row per PE (ELLPACK: `Nt` rows per
//! PE), pads the ragged rows to a uniform width for bulk transfer, and
//! decodes back for verification. Encoding is deterministic; decoding a
//! padded record reproduces the original dense matrix exactly.

pub mod coo;
pub mod csc;
pub mod csr;
pub mod dense;
pub mod ellpack;
pub mod padding;

pub use coo::{pack_triples, GridCoo, PaddedCoo};
pub use csc::{GridCsc, PaddedCsc};
pub use csr::{GridCsr, PaddedCsr};
pub use dense::{GridDense, PaddedDense};
pub use ellpack::{GridEllpack, PaddedEllpack};

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use num_traits::Num;
use sprs::TriMat;

use crate::error::{PlanError, Result};

/// A grid storage scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridFormat {
    /// Dense row-major tiles (no compression)
    Gemm,
    /// Coordinate triples per tile
    Coo,
    /// Compressed sparse row per tile
    Csr,
    /// Compressed sparse column per tile
    Csc,
    /// Fixed entries per row, one row of storage per tile row
    Ellpack,
}

impl GridFormat {
    pub const ALL: [GridFormat; 5] = [
        GridFormat::Gemm,
        GridFormat::Coo,
        GridFormat::Csr,
        GridFormat::Csc,
        GridFormat::Ellpack,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GridFormat::Gemm => "GEMM",
            GridFormat::Coo => "COO",
            GridFormat::Csr => "CSR",
            GridFormat::Csc => "CSC",
            GridFormat::Ellpack => "ELLPACK",
        }
    }

    /// Array labels in the fixed order lengths are reported in
    pub fn array_labels(&self) -> &'static [&'static str] {
        match self {
            GridFormat::Gemm => &["val"],
            GridFormat::Coo => &["val", "x", "y"],
            GridFormat::Csr => &["val", "col_idx", "row_ptr"],
            GridFormat::Csc => &["val", "row_idx", "col_ptr"],
            GridFormat::Ellpack => &["val", "indices"],
        }
    }
}

impl fmt::Display for GridFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GridFormat {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GEMM" | "DENSE" => Ok(GridFormat::Gemm),
            "COO" | "CUSTOM" => Ok(GridFormat::Coo),
            "CSR" => Ok(GridFormat::Csr),
            "CSC" => Ok(GridFormat::Csc),
            "ELLPACK" => Ok(GridFormat::Ellpack),
            _ => Err(PlanError::Parse {
                what: "grid format",
                text: s.to_string(),
            }),
        }
    }
}

/// Fill value used when padding value arrays
///
/// `0` can be a legitimate small value in the consuming kernel, so the
/// default keeps value padding distinguishable; decoding never inspects
/// value padding either way (structural sentinels and pointer counts
/// decide which entries are real).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PadFill {
    #[default]
    NegOne,
    Zero,
}

impl PadFill {
    pub fn value<T: Copy + Num>(&self) -> T {
        match self {
            PadFill::NegOne => T::zero() - T::one(),
            PadFill::Zero => T::zero(),
        }
    }
}

/// Materializes a coordinate-listed matrix as the dense form the encoders
/// consume. Duplicate coordinates keep the last value.
pub fn dense_from_triplets<T: Copy + Num>(tri: &TriMat<T>) -> Array2<T> {
    let mut a = Array2::zeros((tri.rows(), tri.cols()));
    for (&v, (i, j)) in tri.triplet_iter() {
        a[[i, j]] = v;
    }
    a
}

/// Collects the nonzeros of a dense matrix as a coordinate list
pub fn dense_to_triplets<T: Copy + Num>(a: &Array2<T>) -> TriMat<T> {
    let mut tri = TriMat::new((a.nrows(), a.ncols()));
    for ((i, j), &v) in a.indexed_iter() {
        if v != T::zero() {
            tri.add_triplet(i, j, v);
        }
    }
    tri
}
