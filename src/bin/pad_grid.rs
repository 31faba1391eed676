//! Pads a format's ragged CSV arrays and reports the resulting lengths.
//!
//! Usage: `pad_grid <FORMAT> [PREFIX]`
//!
//! Reads `{PREFIX}_{array}.csv` for each of the format's arrays, writes
//! the `_pad.csv` companions, and prints one length per array in the
//! format's fixed order — consumers parse these as the authoritative
//! device buffer sizes.

use std::path::PathBuf;

use gridplan::io::pad_format_files;
use gridplan::GridFormat;

fn main() {
    let mut args = std::env::args().skip(1);
    let format: GridFormat = match args.next().map(|a| a.parse()) {
        Some(Ok(format)) => format,
        Some(Err(err)) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        None => {
            eprintln!("usage: pad_grid <GEMM|COO|CSR|CSC|ELLPACK> [PREFIX]");
            std::process::exit(2);
        }
    };
    let prefix = PathBuf::from(args.next().unwrap_or_else(|| "tmp".to_string()));

    match pad_format_files(format, &prefix) {
        Ok(lengths) => {
            for (label, length) in format.array_labels().iter().zip(lengths) {
                println!("{label} length:");
                println!("{length}");
            }
        }
        Err(err) => {
            eprintln!("padding failed: {err}");
            std::process::exit(1);
        }
    }
}
