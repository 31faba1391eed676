//! Centralized constants for the gridplan library
//!
//! This module contains all hardcoded defaults used throughout the codebase.
//! All new constants should be added here rather than scattered throughout the
//! code. Runtime values live in `PlannerConfig`; these are its defaults.

// ============================================================================
// PER-PE MEMORY BUDGET
// ============================================================================

/// Memory available per PE in bytes (48 kB)
pub const MEM: usize = 48 * 1024;

/// Memory reserved per PE for program and transfer buffers (6 kB)
pub const RESERVED: usize = 6 * 1024;

/// Upper end of the reservation range used by later configuration
/// generations (8 kB)
pub const RESERVED_MAX: usize = 8 * 1024;

/// Size of one array element in bytes (f32 / i32 wavelets)
pub const ELEMENT_BYTES: usize = 4;

/// Alignment of the output dimension in bytes
pub const ALIGN_BYTES: usize = 16;

// ============================================================================
// GRID BOUNDS
// ============================================================================

/// Maximum usable grid height
pub const AVAIL_HEIGHT: usize = 996;

/// Maximum usable grid width
pub const AVAIL_WIDTH: usize = 757;

// ============================================================================
// STATISTICAL BOUND PARAMETERS
// ============================================================================

/// Target probability that no tile exceeds the computed nnz upper bound
pub const GUARANTEE: f64 = 0.99;

/// Headroom factor applied to the cheap nnz estimate used for fast
/// rejection before exact measurement
pub const ESTIMATE_HEADROOM: f64 = 1.15;

// ============================================================================
// SEARCH POLICY
// ============================================================================

/// Configs within this fraction of the maximum observed memory usage are
/// considered near-optimal
pub const NEAR_OPTIMAL_FRACTION: f64 = 0.05;

/// Minimum expected nonzeros per tile for the refined usefulness policy
pub const MIN_EXPECTED_NNZ: f64 = 64.0;

/// Candidate values for the free output dimension M
pub const M_CANDIDATES: [usize; 5] = [32, 64, 128, 256, 512];

/// Densities (percent) covered by the default sweep
pub const SWEEP_DENSITIES: [f64; 4] = [5.0, 10.0, 20.0, 30.0];

/// Matrix shapes (N, K) covered by the default sweep
pub const SWEEP_SHAPES: [(usize, usize); 6] = [
    (768, 768),
    (3072, 768),
    (768, 3072),
    (1024, 1024),
    (4096, 1024),
    (1024, 4096),
];

// ============================================================================
// PADDING SENTINELS
// ============================================================================

/// Sentinel for padded entries in structural index and pointer arrays
pub const INDEX_SENTINEL: i32 = -1;

/// Default sentinel for padded entries in value arrays
pub const VALUE_SENTINEL: f32 = -1.0;

// ============================================================================
// TEST MATRIX GENERATION
// ============================================================================

/// Default seed for reproducible random matrices
pub const DEFAULT_SEED: u64 = 2;

/// Range of generated nonzero magnitudes
pub const VALUE_RANGE: (f32, f32) = (-10.0, 10.0);
