//! Upper bounds on per-tile nonzero counts
//!
//! A tile of `Nt x Kt` elements generated at density `d` holds a
//! `Binomial(Nt*Kt, d/100)` number of nonzeros. Planning needs a bound `k`
//! that *no* tile of the grid exceeds, with probability at least
//! `GUARANTEE` across all `t = height*width` tiles simultaneously. Assuming
//! tiles are independent, a per-tile confidence of `GUARANTEE^(1/t)` gives
//! the simultaneous guarantee; that independence assumption is not
//! validated for structured sparsity patterns.
//!
//! Two interchangeable strategies are provided: the exact binomial tail
//! (default) and a fast normal approximation that degrades for small `n*p`
//! or extreme densities and falls back to the exact tail when it
//! degenerates.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::constants::GUARANTEE;
use crate::grid::{generate_dense, tile_nnz_counts, GridSpec};

/// Numeric strategy for the nonzero upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundStrategy {
    /// Exact binomial tail inversion. Precise; the default.
    #[default]
    ExactBinomial,
    /// Normal approximation `ceil(mean + z * stddev)`. Fast, but
    /// inaccurate for small `n*p` or densities near 0% / 100%; falls
    /// back to the exact tail when it produces a non-finite or negative
    /// bound.
    NormalApprox,
}

/// Memoized per-tile nonzero bound estimator
///
/// Bounds depend only on `(Nt, Kt, density, trials)`, so results are
/// cached; the cache is behind a mutex and safe to share with the
/// parallel candidate evaluation.
#[derive(Debug)]
pub struct NnzBound {
    strategy: BoundStrategy,
    guarantee: f64,
    cache: Mutex<HashMap<(usize, usize, u64, usize), usize>>,
}

impl Default for NnzBound {
    fn default() -> Self {
        Self::new(BoundStrategy::default(), GUARANTEE)
    }
}

impl NnzBound {
    pub fn new(strategy: BoundStrategy, guarantee: f64) -> Self {
        assert!(
            guarantee > 0.0 && guarantee < 1.0,
            "guarantee must be in (0, 1)"
        );
        Self {
            strategy,
            guarantee,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn strategy(&self) -> BoundStrategy {
        self.strategy
    }

    /// Upper bound on the nonzeros of one `nt x kt` tile at `density`
    /// percent, holding across `trials` tiles simultaneously with
    /// probability at least the configured guarantee.
    ///
    /// The result is always in `0..=nt*kt`.
    pub fn upper_bound(&self, nt: usize, kt: usize, density: f64, trials: usize) -> usize {
        let key = (nt, kt, density.to_bits(), trials);
        if let Some(&k) = self.cache.lock().unwrap().get(&key) {
            return k;
        }

        let n = nt * kt;
        let p = density / 100.0;
        let conf = self.guarantee.powf(1.0 / trials.max(1) as f64);

        let k = match self.strategy {
            BoundStrategy::ExactBinomial => binomial_upper_bound(n, p, conf),
            BoundStrategy::NormalApprox => match normal_upper_bound(n, p, conf) {
                Some(k) => k.min(n),
                // Degenerate approximation: fail closed to the exact tail.
                None => binomial_upper_bound(n, p, conf),
            },
        };

        self.cache.lock().unwrap().insert(key, k);
        k
    }
}

/// Smallest `k` such that `P[X <= k] >= conf` for `X ~ Binomial(n, p)`.
///
/// The pmf is accumulated through a log-space recurrence so that the tiny
/// leading terms of large-`n` distributions underflow to zero harmlessly
/// instead of poisoning the sum.
fn binomial_upper_bound(n: usize, p: f64, conf: f64) -> usize {
    if n == 0 || p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return n;
    }

    let ln_q = (-p).ln_1p();
    let ln_ratio = p.ln() - ln_q;

    // pmf(0) = (1-p)^n, then pmf(k+1)/pmf(k) = (n-k)/(k+1) * p/(1-p)
    let mut ln_pmf = n as f64 * ln_q;
    let mut cdf = ln_pmf.exp();
    let mut k = 0usize;

    while cdf < conf && k < n {
        ln_pmf += ((n - k) as f64 / (k + 1) as f64).ln() + ln_ratio;
        k += 1;
        cdf += ln_pmf.exp();
    }
    k
}

/// Normal-approximation bound `ceil(n*p + z * sqrt(n*p*(1-p)))`.
///
/// Returns `None` when the result is non-finite or negative, which
/// happens for degenerate inputs (empty tiles, densities at the ends of
/// the range).
fn normal_upper_bound(n: usize, p: f64, conf: f64) -> Option<usize> {
    let mean = n as f64 * p;
    let std_dev = (n as f64 * p * (1.0 - p)).sqrt();
    let z = normal_quantile(conf)?;

    let k = (mean + z * std_dev).ceil();
    if !k.is_finite() || k < 0.0 {
        return None;
    }
    Some(k as usize)
}

/// Quantile of the standard normal distribution at cumulative
/// probability `p`.
///
/// Acklam's rational approximation, accurate to about 1.15e-9 over
/// (0, 1). Returns `None` outside the open interval.
fn normal_quantile(p: f64) -> Option<f64> {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if !(0.0..=1.0).contains(&p) || p == 0.0 || p == 1.0 {
        return None;
    }

    let x = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };
    x.is_finite().then_some(x)
}

/// Measures the maximum per-tile nonzero count of an actual seeded random
/// instance.
///
/// This is the calibration escape hatch: it carries no probabilistic
/// guarantee for other instances and is not used for planning bounds.
pub fn measured_max_tile_nnz(spec: &GridSpec, density: f64, seed: u64) -> usize {
    let a = generate_dense(spec.n, spec.k, density, seed);
    tile_nnz_counts(&a, spec).into_iter().max().unwrap_or(0)
}
