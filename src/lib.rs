//! # gridplan: grid partition planning for PE-array accelerators
//!
//! gridplan decides how a large `N x K` matrix is split across a
//! `height x width` rectangle of processing elements, each with a small
//! fixed memory budget, and how every PE's tile is encoded for bulk
//! transfer.
//!
//! ## Overview
//!
//! The library covers three coupled concerns:
//!
//! - Deterministic index maps between host arrays and PE-local storage,
//!   for distributing inputs and gathering results.
//! - Lossless encoding of ragged per-tile sparsity into fixed-width grid
//!   formats (dense, COO, CSR, CSC, ELLPACK-style), with padding and the
//!   exact inverse.
//! - A statistical planner that bounds the worst tile's nonzeros with a
//!   configured confidence and searches grid shapes and output widths for
//!   the best configuration under the per-PE budget.
//!
//! ## Usage
//!
//! Planning a configuration:
//!
//! ```
//! use gridplan::{GridFormat, Planner, PlannerConfig};
//!
//! let planner = Planner::new(PlannerConfig::default());
//! let best = planner.best_config(768, 768, 20.0, GridFormat::Csr);
//! assert!(best.is_some());
//! ```
//!
//! Encoding and verifying a grid format:
//!
//! ```
//! use gridplan::{generate_dense, GridCsr, GridSpec, PadFill};
//!
//! let spec = GridSpec::new(8, 8, 2, 2).unwrap();
//! let a = generate_dense(8, 8, 25.0, 2);
//! let record = GridCsr::encode(&a, &spec).unwrap().pad(PadFill::default());
//! assert_eq!(record.decode().unwrap(), a);
//! ```

pub mod constants;
pub mod error;
pub mod estimator;
pub mod format;
pub mod grid;
pub mod indexer;
pub mod io;
pub mod memory;
pub mod search;

// Re-export primary components
pub use error::{PlanError, Result};
pub use estimator::{measured_max_tile_nnz, BoundStrategy, NnzBound};
pub use format::{
    dense_from_triplets, dense_to_triplets, pack_triples, GridCoo, GridCsc, GridCsr, GridDense,
    GridEllpack, GridFormat, PadFill, PaddedCoo, PaddedCsc, PaddedCsr, PaddedDense, PaddedEllpack,
};
pub use grid::{generate_dense, tile_nnz_counts, GridSpec};
pub use indexer::{PeCoord, TileIndexer};
pub use memory::{padded_m, MemoryModel};
pub use search::{GridConfig, Planner, PlannerConfig, SweepReport, SweepRow, TilePolicy};

/// Version information for the gridplan library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
