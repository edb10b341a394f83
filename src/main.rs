//! # colbench
//!
//! Times a physics analysis over one columnar input file.
//!
//! ## Usage
//!
//! ```bash
//! # Dimuon mass over a Parquet file, histogram written as CSV
//! colbench Run2012B_DoubleMuParked.parquet dimuon.csv
//!
//! # Three-body mass with the explicit loop over a ROOT file
//! colbench -a three-body -s explicit B2HHH.root
//!
//! # Generate the sidecar column list for an ORC file
//! colbench --list-columns --output B2HHH_columns.txt B2HHH.orc
//! ```
//!
//! A successful run prints `init, analyze, total` in microseconds.

use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    let started = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprint!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.input.is_none() {
        print!("{}", cli::usage());
        println!();
        return ExitCode::FAILURE;
    }

    cli::init_logging(cli.verbosity());

    match cli::dispatch(cli, started) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
