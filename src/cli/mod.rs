use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use colbench::analysis::AnalysisKind;
use colbench::pipeline::Strategy;

mod config;
mod info;
mod run;

pub use config::Config;

/// colbench - time physics analyses over ROOT, ORC and Parquet files
#[derive(Parser)]
#[command(name = "colbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file; the suffix (root, orc, parquet) selects the reader
    #[arg(value_name = "INPUT_PATH")]
    pub input: Option<PathBuf>,

    /// Write the histogram here (.csv for CSV, anything else for JSON)
    #[arg(value_name = "HISTO_PATH")]
    pub histo: Option<PathBuf>,

    /// Analysis to run
    #[arg(short, long, value_enum)]
    analysis: Option<AnalysisArg>,

    /// Execution strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Maximum rows per batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Tree to read from ROOT files (defaults to the analysis tree)
    #[arg(long)]
    tree: Option<String>,

    /// Read the whole file into memory before analyzing it
    #[arg(long)]
    materialize: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the input's column names instead of running an analysis
    #[arg(long)]
    list_columns: bool,

    /// With --list-columns, write a sidecar column list here instead
    #[arg(short, long, value_name = "FILE", requires = "list_columns")]
    output: Option<PathBuf>,

    /// Print the input's entry count instead of running an analysis
    #[arg(long)]
    count_entries: bool,

    /// Describe the input's storage layout instead of running an analysis
    #[arg(long)]
    describe: bool,

    /// With --describe, print JSON
    #[arg(long, requires = "describe")]
    json: bool,

    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Analysis selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AnalysisArg {
    /// Opposite-sign dimuon mass
    Dimuon,
    /// Three-kaon B candidate mass
    ThreeBody,
}

/// Execution strategy selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Lazily composed frame
    Declarative,
    /// Hand-written batch and row loops
    Explicit,
}

impl From<AnalysisArg> for AnalysisKind {
    fn from(arg: AnalysisArg) -> Self {
        match arg {
            AnalysisArg::Dimuon => AnalysisKind::Dimuon,
            AnalysisArg::ThreeBody => AnalysisKind::ThreeBody,
        }
    }
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Declarative => Strategy::Declarative,
            StrategyArg::Explicit => Strategy::Explicit,
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Usage line printed when no input is given
pub fn usage() -> String {
    use clap::CommandFactory;
    Cli::command().render_usage().to_string()
}

pub fn dispatch(cli: Cli, started: Instant) -> Result<()> {
    let input = cli.input.clone().context("INPUT_PATH is required")?;
    let config = cli.load_config()?;

    let mut reader = config.reader.clone();
    if let Some(batch_size) = cli.batch_size {
        reader = reader.with_batch_size(batch_size);
    }
    if let Some(tree) = &cli.tree {
        reader = reader.with_tree(tree.clone());
    }

    if cli.list_columns {
        return info::list_columns(&input, &reader, cli.output.as_deref());
    }
    if cli.count_entries {
        return info::count_entries(&input, &reader);
    }
    if cli.describe {
        return info::describe(&input, &reader, cli.json);
    }

    let options = run::RunOptions {
        analysis: config.analysis(cli.analysis.map(AnalysisKind::from)),
        strategy: cli
            .strategy
            .map(Strategy::from)
            .or(config.run.strategy)
            .unwrap_or_default(),
        reader,
        materialize: cli.materialize || config.run.materialize.unwrap_or(false),
        histo: cli.histo,
    };
    run::run(input, options, started)
}
