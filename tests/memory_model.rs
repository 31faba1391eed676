//! Memory model contracts: golden totals, monotonicity, measured parity

use gridplan::{
    generate_dense, padded_m, BoundStrategy, GridCsr, GridFormat, GridSpec, MemoryModel, NnzBound,
    PadFill,
};
use proptest::prelude::*;

fn exact_bounds() -> NnzBound {
    NnzBound::new(BoundStrategy::ExactBinomial, 0.99)
}

#[test]
fn golden_byte_totals_for_the_768_example() {
    // N = K = 768, 16x16 grid, 20% density, M = 64: Nt = Kt = 48,
    // exact k = 538, padded_M = 68.
    let bounds = exact_bounds();
    let model = MemoryModel::new(&bounds);

    assert_eq!(padded_m(64), 68);
    assert_eq!(model.bytes_per_pe(GridFormat::Csr, 48, 48, 64, 20.0, 16, 16), 30612);
    assert_eq!(model.bytes_per_pe(GridFormat::Csc, 48, 48, 64, 20.0, 16, 16), 30612);
    assert_eq!(model.bytes_per_pe(GridFormat::Coo, 48, 48, 64, 20.0, 16, 16), 32568);
    assert_eq!(model.bytes_per_pe(GridFormat::Gemm, 48, 48, 64, 20.0, 16, 16), 35328);
}

#[test]
fn dense_is_independent_of_density() {
    let bounds = exact_bounds();
    let model = MemoryModel::new(&bounds);
    let low = model.bytes_per_pe(GridFormat::Gemm, 32, 32, 64, 1.0, 4, 4);
    let high = model.bytes_per_pe(GridFormat::Gemm, 32, 32, 64, 99.0, 4, 4);
    assert_eq!(low, high);
}

#[test]
fn measured_csr_lengths_price_below_the_statistical_bound() {
    // Encoding a real instance and pricing its padded lengths must not
    // exceed the statistical worst case for the same shape.
    let spec = GridSpec::new(96, 96, 4, 4).unwrap();
    let density = 20.0;
    let a = generate_dense(spec.n, spec.k, density, gridplan::constants::DEFAULT_SEED);
    let record = GridCsr::encode(&a, &spec).unwrap().pad(PadFill::NegOne);

    // A tighter guarantee keeps the statistical ceiling above any single
    // sampled instance.
    let bounds = NnzBound::new(BoundStrategy::ExactBinomial, 0.999);
    let model = MemoryModel::new(&bounds);
    let measured = model.bytes_per_pe_measured(
        GridFormat::Csr,
        &record.lengths,
        spec.tile_rows(),
        spec.tile_cols(),
        64,
    );
    let statistical = model.bytes_per_pe(
        GridFormat::Csr,
        spec.tile_rows(),
        spec.tile_cols(),
        64,
        density,
        spec.width,
        spec.height,
    );
    assert!(
        measured <= statistical,
        "measured {measured} exceeded statistical {statistical}"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn monotone_in_every_dimension(
        nt in 1usize..48,
        kt in 1usize..48,
        m in 1usize..256,
        density in 1.0f64..99.0,
        grid in 1usize..6,
    ) {
        let bounds = exact_bounds();
        let model = MemoryModel::new(&bounds);
        for format in GridFormat::ALL {
            let base = model.bytes_per_pe(format, nt, kt, m, density, grid, grid);
            prop_assert!(model.bytes_per_pe(format, nt + 1, kt, m, density, grid, grid) >= base);
            prop_assert!(model.bytes_per_pe(format, nt, kt + 1, m, density, grid, grid) >= base);
            prop_assert!(model.bytes_per_pe(format, nt, kt, m + 1, density, grid, grid) >= base);
            prop_assert!(model.bytes_per_pe(format, nt, kt, m, density + 1.0, grid, grid) >= base);
        }
    }

    #[test]
    fn padded_m_alignment_invariants(m in 1usize..4096) {
        let pm = padded_m(m);
        // A multiple of 4 elements, strictly wider than M (the reserved
        // column), and never more than one alignment step beyond M+1.
        prop_assert_eq!(pm % 4, 0);
        prop_assert!(pm > m);
        prop_assert!(pm < m + 1 + 4);
    }
}
