//! Re-checks published sweep summaries against the memory model.
//!
//! Usage: `verify_limits [FILE...]`
//!
//! Each file holds the six-list summary for one format and is named
//! `FORMAT_params.txt`; every row is re-priced and must fit the budget.

use std::path::Path;

use gridplan::{GridFormat, PlannerConfig, SweepReport};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let files: Vec<String> = if args.is_empty() {
        ["GEMM", "COO", "CSC", "CSR", "ELLPACK"]
            .iter()
            .map(|f| format!("{f}_params.txt"))
            .collect()
    } else {
        args
    };

    let config = PlannerConfig::default();
    let mut failed = false;

    for file in &files {
        let path = Path::new(file);
        let format: GridFormat = match path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('_').next())
            .map(str::parse)
        {
            Some(Ok(format)) => format,
            _ => {
                eprintln!("[!] cannot infer format from {file}");
                failed = true;
                continue;
            }
        };

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("[!] cannot read {file}: {err}");
                failed = true;
                continue;
            }
        };

        match SweepReport::parse(format, &text) {
            Ok(report) => {
                let violations = report.verify(&config);
                if violations.is_empty() {
                    println!("[!] {file} verified and correct!");
                } else {
                    eprintln!("[!] {file}: rows {violations:?} exceed the budget");
                    failed = true;
                }
            }
            Err(err) => {
                eprintln!("[!] cannot parse {file}: {err}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
