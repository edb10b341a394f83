use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

use colbench::analysis::AnalysisConfig;
use colbench::benchmark::BenchmarkRun;
use colbench::pipeline::Strategy;
use colbench::reader::ReaderConfig;
use colbench::timing::micros;

/// Settings of one timed run, after merging flags over the config file
pub struct RunOptions {
    pub analysis: AnalysisConfig,
    pub strategy: Strategy,
    pub reader: ReaderConfig,
    pub materialize: bool,
    pub histo: Option<PathBuf>,
}

/// Run the analysis and print `init, analyze, total` microseconds
pub fn run(input: PathBuf, options: RunOptions, started: Instant) -> Result<()> {
    info!(
        "Running {} analysis on {} ({} strategy)",
        options.analysis.kind(),
        input.display(),
        options.strategy
    );

    let report = BenchmarkRun::new(input, options.analysis)
        .with_strategy(options.strategy)
        .with_reader(options.reader)
        .with_materialize(options.materialize)
        .run()?;

    info!(
        "Histogram {}: {} in range, {} underflow, {} overflow, {} NaN",
        report.histogram.name(),
        report.histogram.integral(),
        report.histogram.underflow(),
        report.histogram.overflow(),
        report.histogram.dropped_nan()
    );

    if let Some(path) = &options.histo {
        report
            .histogram
            .export(path)
            .with_context(|| format!("Failed to write histogram to {}", path.display()))?;
        info!("Wrote histogram to {}", path.display());
    }

    println!("{}, {}", report.timing, micros(started.elapsed()));
    Ok(())
}
