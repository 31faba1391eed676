use gridplan::constants::{SWEEP_DENSITIES, SWEEP_SHAPES};
use gridplan::{GridFormat, Planner, PlannerConfig};

fn main() {
    // Format is the single optional argument; everything else comes from
    // the planner configuration.
    let format: GridFormat = match std::env::args().nth(1) {
        Some(arg) => match arg.parse() {
            Ok(format) => format,
            Err(err) => {
                eprintln!("{err}");
                eprintln!("expected one of: GEMM, COO, CSR, CSC, ELLPACK");
                std::process::exit(2);
            }
        },
        None => GridFormat::Coo,
    };

    let planner = Planner::new(PlannerConfig::default());
    eprintln!(
        "planning {} over {} shapes x {} densities (budget {} B per PE)",
        format,
        SWEEP_SHAPES.len(),
        SWEEP_DENSITIES.len(),
        planner.config().budget(),
    );

    let report = planner.sweep(&SWEEP_SHAPES, &SWEEP_DENSITIES, format);

    for row in &report.rows {
        if row.config.is_none() {
            eprintln!(
                "no {} configuration fits {}x{} at {}% density",
                format, row.n, row.k, row.density
            );
        }
    }

    println!("{report}");
}
