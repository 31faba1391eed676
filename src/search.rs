//! Grid configuration search
//!
//! For a matrix shape and density, enumerate every `(height, width)` pair
//! that divides the matrix within the hardware bounds, price each pair at
//! every candidate output width `M`, and pick the configuration that fits
//! the per-PE budget with the best utilization. Selection is a staged
//! filter, not a single objective, and the stage order is part of the
//! contract: budget, near-optimal usage, tile granularity, near-optimal
//! usage again, then the widest `M` with first-in-enumeration-order as the
//! final tie-break.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::constants::{
    AVAIL_HEIGHT, AVAIL_WIDTH, GUARANTEE, MEM, MIN_EXPECTED_NNZ, M_CANDIDATES,
    NEAR_OPTIMAL_FRACTION, RESERVED,
};
use crate::error::{PlanError, Result};
use crate::estimator::{BoundStrategy, NnzBound};
use crate::format::GridFormat;
use crate::memory::MemoryModel;

/// Tile granularity policy for selection stage 3
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TilePolicy {
    /// Keep the configs with the largest tile (`Nt * Kt`)
    MaxTileSize,
    /// Refined: first drop configs whose expected nonzero count
    /// (`Nt*Kt*density/100`) does not exceed the threshold, then keep the
    /// largest tile
    MinExpectedNnz(f64),
}

impl Default for TilePolicy {
    fn default() -> Self {
        TilePolicy::MaxTileSize
    }
}

/// Externally configurable planning parameters
///
/// All budget and bound constants live here rather than at their use
/// sites; `Default` mirrors the shipped hardware generation.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Memory available per PE in bytes
    pub mem: usize,
    /// Bytes reserved for program and transfer buffers
    pub reserved: usize,
    /// Simultaneous-bound confidence target
    pub guarantee: f64,
    /// Maximum usable grid height
    pub avail_height: usize,
    /// Maximum usable grid width
    pub avail_width: usize,
    /// Candidate output widths, in enumeration order
    pub m_candidates: Vec<usize>,
    /// Near-optimal usage window for stages 2 and 4
    pub near_optimal_fraction: f64,
    /// Tile granularity policy for stage 3
    pub tile_policy: TilePolicy,
    /// Nonzero bound strategy
    pub strategy: BoundStrategy,
    /// Worker threads for candidate evaluation
    pub n_threads: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mem: MEM,
            reserved: RESERVED,
            guarantee: GUARANTEE,
            avail_height: AVAIL_HEIGHT,
            avail_width: AVAIL_WIDTH,
            m_candidates: M_CANDIDATES.to_vec(),
            near_optimal_fraction: NEAR_OPTIMAL_FRACTION,
            tile_policy: TilePolicy::MaxTileSize,
            strategy: BoundStrategy::ExactBinomial,
            n_threads: num_cpus::get(),
        }
    }
}

impl PlannerConfig {
    /// Usable per-PE budget: total memory minus the reservation
    pub fn budget(&self) -> usize {
        self.mem - self.reserved
    }

    /// The refined policy with the default usefulness threshold
    pub fn with_refined_policy(mut self) -> Self {
        self.tile_policy = TilePolicy::MinExpectedNnz(MIN_EXPECTED_NNZ);
        self
    }
}

/// One evaluated grid configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Per-PE memory usage in bytes
    pub mem_used: usize,
    /// Grid height
    pub height: usize,
    /// Grid width
    pub width: usize,
    /// Tile size `Nt * Kt`
    pub tile_elems: usize,
    /// Output width
    pub m: usize,
    /// Per-PE structural array lengths implied by the bound, in
    /// array-label order
    pub lengths: Vec<usize>,
}

/// Configuration search over grid shapes and output widths
pub struct Planner {
    config: PlannerConfig,
    bounds: NnzBound,
    pool: rayon::ThreadPool,
}

impl Planner {
    /// Builds a planner with its own worker pool sized by
    /// `config.n_threads`.
    ///
    /// # Panics
    ///
    /// Panics if the worker pool cannot be created.
    pub fn new(config: PlannerConfig) -> Self {
        let bounds = NnzBound::new(config.strategy, config.guarantee);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_threads)
            .build()
            .expect("failed to build candidate evaluation pool");
        Self {
            config,
            bounds,
            pool,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Best configuration for one `(n, k, density)` point, or `None` when
    /// nothing fits the budget — infeasibility is a result, not an error.
    pub fn best_config(
        &self,
        n: usize,
        k: usize,
        density: f64,
        format: GridFormat,
    ) -> Option<GridConfig> {
        let candidates = self.evaluate_candidates(n, k, density, format);

        // Stage 1: strictly inside the usable budget.
        let budget = self.config.budget();
        let fitting: Vec<GridConfig> = candidates
            .into_iter()
            .filter(|c| c.mem_used < budget)
            .collect();
        if fitting.is_empty() {
            return None;
        }

        // Stage 2: within the near-optimal usage window across all M.
        let near = retain_near_optimal(fitting, self.config.near_optimal_fraction);

        // Stage 3: maximal tile granularity (optionally dropping tiles
        // too sparse to be useful first).
        let granular = retain_max_tile(near, self.config.tile_policy, density)?;

        // Stage 4: the usage window again, now that stage 3 narrowed the
        // candidate set.
        let near_again = retain_near_optimal(granular, self.config.near_optimal_fraction);

        // Stage 5: widest M, then first in enumeration order.
        let max_m = near_again.iter().map(|c| c.m).max()?;
        near_again.into_iter().find(|c| c.m == max_m)
    }

    /// Every `(m, height, width)` candidate priced by the memory model,
    /// in deterministic enumeration order (`m` outermost, height, then
    /// width).
    ///
    /// Evaluation is a pure function per candidate, parallelized with an
    /// order-preserving collect; tie-breaks happen after collection.
    fn evaluate_candidates(
        &self,
        n: usize,
        k: usize,
        density: f64,
        format: GridFormat,
    ) -> Vec<GridConfig> {
        let heights: Vec<usize> = (1..=self.config.avail_height.min(n))
            .filter(|h| n % h == 0)
            .collect();
        let widths: Vec<usize> = (1..=self.config.avail_width.min(k))
            .filter(|w| k % w == 0)
            .collect();

        let mut triples = Vec::with_capacity(self.config.m_candidates.len() * heights.len() * widths.len());
        for &m in &self.config.m_candidates {
            for &h in &heights {
                for &w in &widths {
                    triples.push((m, h, w));
                }
            }
        }

        let model = MemoryModel::new(&self.bounds);
        self.pool.install(|| {
            triples
                .into_par_iter()
                .map(|(m, h, w)| {
                    let nt = n / h;
                    let kt = k / w;
                    GridConfig {
                        mem_used: model.bytes_per_pe(format, nt, kt, m, density, w, h),
                        height: h,
                        width: w,
                        tile_elems: nt * kt,
                        m,
                        lengths: model.array_lengths(format, nt, kt, density, w * h),
                    }
                })
                .collect()
        })
    }

    /// Plans every `(density, shape)` point of a sweep; infeasible points
    /// are recorded and the sweep continues.
    pub fn sweep(
        &self,
        shapes: &[(usize, usize)],
        densities: &[f64],
        format: GridFormat,
    ) -> SweepReport {
        let mut rows = Vec::with_capacity(shapes.len() * densities.len());
        for &density in densities {
            for &(n, k) in shapes {
                rows.push(SweepRow {
                    n,
                    k,
                    density,
                    config: self.best_config(n, k, density, format),
                });
            }
        }
        SweepReport { format, rows }
    }
}

/// Stage 2/4 helper: keep configs strictly above `max - max*fraction`
fn retain_near_optimal(mut configs: Vec<GridConfig>, fraction: f64) -> Vec<GridConfig> {
    let max_used = configs.iter().map(|c| c.mem_used).max().unwrap_or(0);
    let floor = max_used as f64 - max_used as f64 * fraction;
    configs.retain(|c| c.mem_used as f64 > floor);
    configs
}

/// Stage 3 helper: keep configs with maximal tile size, after the
/// optional usefulness threshold. Returns `None` when the threshold
/// eliminates every candidate.
fn retain_max_tile(
    mut configs: Vec<GridConfig>,
    policy: TilePolicy,
    density: f64,
) -> Option<Vec<GridConfig>> {
    if let TilePolicy::MinExpectedNnz(threshold) = policy {
        configs.retain(|c| c.tile_elems as f64 * density / 100.0 > threshold);
        if configs.is_empty() {
            return None;
        }
    }
    let max_tile = configs.iter().map(|c| c.tile_elems).max()?;
    configs.retain(|c| c.tile_elems == max_tile);
    Some(configs)
}

/// One sweep point and its outcome
#[derive(Debug, Clone)]
pub struct SweepRow {
    pub n: usize,
    pub k: usize,
    pub density: f64,
    /// `None` records budget infeasibility for this point
    pub config: Option<GridConfig>,
}

/// Sweep results in the six-list summary text format
///
/// The lists carry one entry per feasible sweep point, all of equal
/// length; infeasible points stay queryable on [`SweepReport::rows`].
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub format: GridFormat,
    pub rows: Vec<SweepRow>,
}

impl SweepReport {
    /// Rows that found a configuration
    pub fn feasible(&self) -> impl Iterator<Item = (&SweepRow, &GridConfig)> {
        self.rows
            .iter()
            .filter_map(|row| row.config.as_ref().map(|c| (row, c)))
    }

    /// Parses the six-list summary text
    pub fn parse(format: GridFormat, text: &str) -> Result<Self> {
        let mut lists: Vec<(String, Vec<f64>)> = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (name, body) = line.split_once("=(").ok_or_else(|| PlanError::Parse {
                what: "summary line",
                text: line.to_string(),
            })?;
            let body = body.strip_suffix(')').ok_or_else(|| PlanError::Parse {
                what: "summary line",
                text: line.to_string(),
            })?;
            let values = body
                .split_whitespace()
                .map(|v| {
                    f64::from_str(v).map_err(|_| PlanError::Parse {
                        what: "summary value",
                        text: v.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            lists.push((name.to_string(), values));
        }

        let get = |key: &str| -> Result<Vec<f64>> {
            lists
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| PlanError::Parse {
                    what: "summary list",
                    text: key.to_string(),
                })
        };

        let heights = get("A_heights")?;
        let widths = get("A_widths")?;
        let densities = get("A_densities")?;
        let grid_h = get("grid_h")?;
        let grid_w = get("grid_w")?;
        let m_w = get("M_w")?;

        let len = heights.len();
        if [&widths, &densities, &grid_h, &grid_w, &m_w]
            .iter()
            .any(|l| l.len() != len)
        {
            return Err(PlanError::Parse {
                what: "summary lists",
                text: "unequal list lengths".to_string(),
            });
        }

        let rows = (0..len)
            .map(|i| {
                let n = heights[i] as usize;
                let k = widths[i] as usize;
                let height = grid_h[i] as usize;
                let width = grid_w[i] as usize;
                SweepRow {
                    n,
                    k,
                    density: densities[i],
                    config: Some(GridConfig {
                        mem_used: 0,
                        height,
                        width,
                        tile_elems: (n / height.max(1)) * (k / width.max(1)),
                        m: m_w[i] as usize,
                        lengths: Vec::new(),
                    }),
                }
            })
            .collect();
        Ok(Self { format, rows })
    }

    /// Re-prices every parsed row and returns the indices of rows whose
    /// usage exceeds the budget. Empty means the summary is verified.
    ///
    /// The after-the-fact check accepts exact equality; only admission
    /// into the search is strict.
    pub fn verify(&self, config: &PlannerConfig) -> Vec<usize> {
        let bounds = NnzBound::new(config.strategy, config.guarantee);
        let model = MemoryModel::new(&bounds);
        let mut violations = Vec::new();
        for (i, (row, cfg)) in self.feasible().enumerate() {
            let nt = row.n / cfg.height;
            let kt = row.k / cfg.width;
            let used = model.bytes_per_pe(
                self.format,
                nt,
                kt,
                cfg.m,
                row.density,
                cfg.width,
                cfg.height,
            );
            if used > config.budget() {
                violations.push(i);
            }
        }
        violations
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |name: &str, pick: &dyn Fn(&SweepRow, &GridConfig) -> String| {
            let values: Vec<String> = self.feasible().map(|(r, c)| pick(r, c)).collect();
            format!("{}=({})", name, values.join(" "))
        };
        writeln!(f, "{}", list("A_heights", &|r, _| r.n.to_string()))?;
        writeln!(f, "{}", list("A_widths", &|r, _| r.k.to_string()))?;
        writeln!(f, "{}", list("A_densities", &|r, _| r.density.to_string()))?;
        writeln!(f, "{}", list("grid_h", &|_, c| c.height.to_string()))?;
        writeln!(f, "{}", list("grid_w", &|_, c| c.width.to_string()))?;
        write!(f, "{}", list("M_w", &|_, c| c.m.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(mem_used: usize, tile_elems: usize, m: usize) -> GridConfig {
        GridConfig {
            mem_used,
            height: 1,
            width: 1,
            tile_elems,
            m,
            lengths: Vec::new(),
        }
    }

    #[test]
    fn test_budget_filter_is_strict() {
        let config = PlannerConfig::default();
        let budget = config.budget();
        assert_eq!(budget, 49152 - 6144);

        let candidates = vec![
            config_with(budget - 1, 64, 32),
            config_with(budget, 64, 32),
        ];
        let fitting: Vec<_> = candidates
            .into_iter()
            .filter(|c| c.mem_used < budget)
            .collect();
        assert_eq!(fitting.len(), 1);
        assert_eq!(fitting[0].mem_used, budget - 1);
    }

    #[test]
    fn test_near_optimal_window_is_strict() {
        let kept = retain_near_optimal(
            vec![
                config_with(1000, 1, 32),
                config_with(950, 1, 32),
                config_with(949, 1, 32),
            ],
            0.05,
        );
        // Floor is 950.0; only strictly-above survives.
        let usages: Vec<usize> = kept.iter().map(|c| c.mem_used).collect();
        assert_eq!(usages, vec![1000]);
    }

    #[test]
    fn test_max_tile_policy() {
        let kept = retain_max_tile(
            vec![
                config_with(100, 64, 32),
                config_with(90, 256, 32),
                config_with(80, 256, 64),
            ],
            TilePolicy::MaxTileSize,
            10.0,
        )
        .unwrap();
        assert!(kept.iter().all(|c| c.tile_elems == 256));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_refined_policy_drops_sparse_tiles() {
        // 256 elements at 10% = 25.6 expected nonzeros: below 64.
        let kept = retain_max_tile(
            vec![config_with(100, 256, 32), config_with(90, 1024, 32)],
            TilePolicy::MinExpectedNnz(64.0),
            10.0,
        )
        .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].tile_elems, 1024);
    }

    #[test]
    fn test_refined_policy_can_eliminate_all() {
        let kept = retain_max_tile(
            vec![config_with(100, 16, 32)],
            TilePolicy::MinExpectedNnz(64.0),
            1.0,
        );
        assert!(kept.is_none());
    }

    #[test]
    fn test_best_config_golden_shape() {
        let planner = Planner::new(PlannerConfig::default());
        let best = planner
            .best_config(768, 768, 20.0, GridFormat::Csr)
            .expect("768x768 at 20% must be plannable");
        assert_eq!(768 % best.height, 0);
        assert_eq!(768 % best.width, 0);
        assert!(best.mem_used < planner.config().budget());
        assert!(planner.config().m_candidates.contains(&best.m));
    }

    #[test]
    fn test_infeasible_is_none_not_error() {
        // A 1x1 grid forces the whole matrix onto one PE; dense storage
        // of 768x768 f32 can never fit 48 kB.
        let config = PlannerConfig {
            avail_height: 1,
            avail_width: 1,
            ..PlannerConfig::default()
        };
        let planner = Planner::new(config);
        assert!(planner.best_config(768, 768, 20.0, GridFormat::Gemm).is_none());
    }

    #[test]
    fn test_sweep_continues_past_infeasible() {
        let config = PlannerConfig {
            avail_height: 1,
            avail_width: 1,
            ..PlannerConfig::default()
        };
        let planner = Planner::new(config);
        let report = planner.sweep(&[(768, 768), (4, 4)], &[20.0], GridFormat::Gemm);
        assert_eq!(report.rows.len(), 2);
        assert!(report.rows[0].config.is_none());
        assert!(report.rows[1].config.is_some());
    }

    #[test]
    fn test_report_roundtrip() {
        let planner = Planner::new(PlannerConfig::default());
        let report = planner.sweep(&[(768, 768)], &[20.0], GridFormat::Csr);
        let text = report.to_string();
        let parsed = SweepReport::parse(GridFormat::Csr, &text).unwrap();
        assert_eq!(parsed.rows.len(), report.feasible().count());
        assert!(parsed.verify(planner.config()).is_empty());
    }

    #[test]
    fn test_deterministic_tie_break() {
        let planner = Planner::new(PlannerConfig::default());
        let a = planner.best_config(768, 768, 20.0, GridFormat::Csc);
        let b = planner.best_config(768, 768, 20.0, GridFormat::Csc);
        assert_eq!(a, b);
    }
}
