//! Planner benchmarks: bound computation and a full shape search

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gridplan::{BoundStrategy, GridFormat, NnzBound, Planner, PlannerConfig};

fn bench_bounds(c: &mut Criterion) {
    c.bench_function("exact_bound_2304_trials_256", |b| {
        b.iter(|| {
            // Fresh estimator per iteration so the memo cache does not
            // turn the benchmark into a lookup.
            let bound = NnzBound::new(BoundStrategy::ExactBinomial, 0.99);
            black_box(bound.upper_bound(black_box(48), black_box(48), black_box(20.0), 256))
        })
    });

    c.bench_function("normal_bound_2304_trials_256", |b| {
        b.iter(|| {
            let bound = NnzBound::new(BoundStrategy::NormalApprox, 0.99);
            black_box(bound.upper_bound(black_box(48), black_box(48), black_box(20.0), 256))
        })
    });
}

fn bench_search(c: &mut Criterion) {
    c.bench_function("best_config_768_csr", |b| {
        let planner = Planner::new(PlannerConfig::default());
        b.iter(|| black_box(planner.best_config(768, 768, 20.0, GridFormat::Csr)))
    });
}

criterion_group!(benches, bench_bounds, bench_search);
criterion_main!(benches);
