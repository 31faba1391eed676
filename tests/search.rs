//! Configuration search behavior: budget strictness, staged selection,
//! sweep reporting

use gridplan::{
    BoundStrategy, GridFormat, GridSpec, MemoryModel, NnzBound, Planner, PlannerConfig,
    SweepReport, TilePolicy,
};

/// Planner restricted to a single candidate so admission is the only
/// degree of freedom.
fn single_candidate_config(mem: usize, reserved: usize) -> PlannerConfig {
    PlannerConfig {
        mem,
        reserved,
        avail_height: 1,
        avail_width: 1,
        m_candidates: vec![32],
        ..PlannerConfig::default()
    }
}

#[test]
fn budget_admission_is_strictly_less_than() {
    // Price the only possible candidate, then set the budget exactly at
    // and one byte above that usage: equality must be rejected.
    let bounds = NnzBound::new(BoundStrategy::ExactBinomial, 0.99);
    let model = MemoryModel::new(&bounds);
    let usage = model.bytes_per_pe(GridFormat::Csr, 16, 16, 32, 20.0, 1, 1);

    let reserved = 6144;
    let at_limit = Planner::new(single_candidate_config(usage + reserved, reserved));
    assert!(at_limit.best_config(16, 16, 20.0, GridFormat::Csr).is_none());

    let one_byte_more = Planner::new(single_candidate_config(usage + reserved + 1, reserved));
    let best = one_byte_more
        .best_config(16, 16, 20.0, GridFormat::Csr)
        .expect("usage == budget - 1 must be admitted");
    assert_eq!(best.mem_used, usage);
}

#[test]
fn selection_prefers_larger_tiles_over_larger_usage() {
    // Across all admitted candidates the search keeps the maximal
    // Nt*Kt before re-filtering on usage.
    let planner = Planner::new(PlannerConfig::default());
    let best = planner
        .best_config(768, 768, 20.0, GridFormat::Csr)
        .unwrap();

    // Any admitted competitor with a strictly larger tile would have
    // been kept instead; verify none exists by scanning the divisor
    // space at the chosen M.
    let bounds = NnzBound::new(BoundStrategy::ExactBinomial, 0.99);
    let model = MemoryModel::new(&bounds);
    let budget = planner.config().budget();
    for h in (1..=768usize).filter(|h| 768 % h == 0) {
        for w in (1..=757usize).filter(|w| 768 % w == 0) {
            let (nt, kt) = (768 / h, 768 / w);
            let used = model.bytes_per_pe(GridFormat::Csr, nt, kt, best.m, 20.0, w, h);
            if used < budget {
                assert!(
                    nt * kt <= best.tile_elems || used <= best.mem_used,
                    "tile {}x{} ({} B) dominates chosen {} ({} B)",
                    nt,
                    kt,
                    used,
                    best.tile_elems,
                    best.mem_used
                );
            }
        }
    }
}

#[test]
fn refined_policy_rejects_useless_tiles() {
    // At a vanishing density every tile's expected nonzero count is
    // below the usefulness threshold: the refined policy reports
    // infeasible where the plain policy still picks something.
    let plain = Planner::new(PlannerConfig {
        m_candidates: vec![32],
        ..PlannerConfig::default()
    });
    let refined = Planner::new(
        PlannerConfig {
            m_candidates: vec![32],
            ..PlannerConfig::default()
        }
        .with_refined_policy(),
    );

    assert!(plain.best_config(64, 64, 0.1, GridFormat::Coo).is_some());
    assert!(refined.best_config(64, 64, 0.1, GridFormat::Coo).is_none());
}

#[test]
fn refined_policy_matches_plain_when_tiles_are_dense_enough() {
    let plain = Planner::new(PlannerConfig::default());
    let refined = Planner::new(PlannerConfig::default().with_refined_policy());
    assert_eq!(
        plain.best_config(768, 768, 20.0, GridFormat::Csr),
        refined.best_config(768, 768, 20.0, GridFormat::Csr)
    );
}

#[test]
fn ties_resolve_to_widest_m_first_in_order() {
    let planner = Planner::new(PlannerConfig::default());
    let best = planner.best_config(256, 256, 20.0, GridFormat::Csc).unwrap();
    // Re-running is bit-identical: enumeration order is the final
    // tie-break, and evaluation is pure.
    for _ in 0..3 {
        assert_eq!(
            planner.best_config(256, 256, 20.0, GridFormat::Csc).as_ref(),
            Some(&best)
        );
    }
}

#[test]
fn sweep_records_infeasible_points_and_continues() {
    let config = PlannerConfig {
        avail_height: 1,
        avail_width: 1,
        m_candidates: vec![512],
        ..PlannerConfig::default()
    };
    let planner = Planner::new(config);
    let report = planner.sweep(
        &[(1024, 1024), (8, 8), (2048, 2048)],
        &[10.0, 30.0],
        GridFormat::Gemm,
    );

    assert_eq!(report.rows.len(), 6);
    // The whole-matrix tile never fits; the 8x8 matrix always does.
    for row in &report.rows {
        assert_eq!(row.config.is_some(), row.n == 8);
    }
    assert_eq!(report.feasible().count(), 2);
}

#[test]
fn summary_text_roundtrips_and_verifies() {
    let planner = Planner::new(PlannerConfig::default());
    let report = planner.sweep(
        &[(768, 768), (1024, 1024)],
        &[10.0, 20.0],
        GridFormat::Csr,
    );
    let text = report.to_string();

    // Six parenthesized lists, one line each.
    for name in ["A_heights", "A_widths", "A_densities", "grid_h", "grid_w", "M_w"] {
        assert!(
            text.lines().any(|l| l.starts_with(&format!("{name}=("))),
            "missing {name} in:\n{text}"
        );
    }

    let parsed = SweepReport::parse(GridFormat::Csr, &text).unwrap();
    assert_eq!(parsed.rows.len(), report.feasible().count());
    assert!(parsed.verify(planner.config()).is_empty());
}

#[test]
fn chosen_configs_respect_the_divisibility_invariant() {
    let planner = Planner::new(PlannerConfig::default());
    let report = planner.sweep(&[(768, 3072), (3072, 768)], &[20.0], GridFormat::Coo);
    for (row, cfg) in report.feasible() {
        // The planner only ever proposes valid grid specs.
        let spec = GridSpec::new(row.n, row.k, cfg.height, cfg.width).unwrap();
        assert_eq!(spec.tile_elems(), cfg.tile_elems);
        assert!(cfg.height <= planner.config().avail_height);
        assert!(cfg.width <= planner.config().avail_width);
    }
}

#[test]
fn policy_default_is_max_tile_size() {
    assert_eq!(PlannerConfig::default().tile_policy, TilePolicy::MaxTileSize);
}

#[test]
fn larger_reservation_generation_still_plans_the_768_example() {
    let planner = Planner::new(PlannerConfig {
        reserved: gridplan::constants::RESERVED_MAX,
        ..PlannerConfig::default()
    });
    let best = planner.best_config(768, 768, 20.0, GridFormat::Csr).unwrap();
    assert!(best.mem_used < planner.config().budget());
}
