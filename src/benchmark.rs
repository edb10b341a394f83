//! # Benchmark Orchestration
//!
//! Resolves the input format, chooses the column projection, then opens the
//! source and runs the analysis inside the timing harness.
//!
//! The projection depends on the format: native files read the analysis
//! columns from the configured tree, while the other formats read the
//! columns listed in the sidecar `<basename>_columns.txt`.

use std::path::PathBuf;

use crate::analysis::AnalysisConfig;
use crate::format::{read_column_names, FileFormat, FormatDescriptor, FormatError};
use crate::histogram::Histogram1D;
use crate::pipeline::{PipelineError, RunStats, Strategy};
use crate::reader::{ColumnSource, ReaderConfig, ReaderError};
use crate::timing::{FirstEntryMark, Stopwatch, TimingRecord};

/// Errors raised by a benchmark run
#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    /// Format error
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Reader error
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl BenchmarkError {
    /// Whether the input path names an unsupported format
    pub fn is_unknown_format(&self) -> bool {
        matches!(self, BenchmarkError::Format(FormatError::UnknownSuffix(_)))
    }
}

/// One benchmark invocation
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    /// Input file
    pub input: PathBuf,
    /// Analysis to run
    pub analysis: AnalysisConfig,
    /// Execution strategy
    pub strategy: Strategy,
    /// Reader settings
    pub reader: ReaderConfig,
    /// Read the whole file into memory before analyzing it
    pub materialize: bool,
}

impl BenchmarkRun {
    /// Run `analysis` over `input` with default settings
    pub fn new(input: impl Into<PathBuf>, analysis: AnalysisConfig) -> Self {
        Self {
            input: input.into(),
            analysis,
            strategy: Strategy::default(),
            reader: ReaderConfig::default(),
            materialize: false,
        }
    }

    /// Set the execution strategy
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the reader settings
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Read the whole file before analyzing it
    pub fn with_materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }

    /// Columns to read from `descriptor`
    pub fn projection(&self, descriptor: &FormatDescriptor) -> Result<Vec<String>, BenchmarkError> {
        let required: Vec<String> = self.analysis.columns().into_iter().map(|c| c.name).collect();
        if !descriptor.format.uses_sidecar() {
            return Ok(required);
        }

        let sidecar = descriptor.sidecar_path();
        if !sidecar.exists() {
            log::warn!(
                "No column list at {}, reading the {} analysis columns",
                sidecar.display(),
                required.len()
            );
            return Ok(required);
        }

        let names = read_column_names(&descriptor.basename)?;
        if let Some(missing) = required.iter().find(|r| !names.contains(r)) {
            return Err(ReaderError::ColumnNotFound(format!(
                "{} (not listed in {})",
                missing,
                sidecar.display()
            ))
            .into());
        }
        log::info!("Read {} column names from {}", names.len(), sidecar.display());
        Ok(names)
    }

    fn reader_config(&self, format: FileFormat) -> ReaderConfig {
        let mut config = self.reader.clone();
        if format == FileFormat::Root && config.tree.is_none() {
            config.tree = Some(self.analysis.tree().to_string());
        }
        config
    }

    /// Open the input and run the analysis, timing both phases
    pub fn run(&self) -> Result<BenchmarkReport, BenchmarkError> {
        let descriptor = FormatDescriptor::from_path(&self.input)?;
        let pipeline = self.analysis.pipeline()?;
        let projection = self.projection(&descriptor)?;
        let config = self.reader_config(descriptor.format);

        let watch = Stopwatch::start();
        let mark = FirstEntryMark::new();
        let mut source =
            ColumnSource::open_projected(&descriptor, pipeline.columns(), &projection, &config)?;
        if self.materialize {
            source = source.materialize()?;
        }
        let output = pipeline.run(source, self.strategy, &mark)?;
        let timing = watch.finish(&mark);

        log::info!(
            "{} of {} entries passed ({} malformed)",
            output.stats.entries_passed,
            output.stats.entries_read,
            output.stats.entries_malformed
        );
        Ok(BenchmarkReport {
            format: descriptor.format,
            strategy: self.strategy,
            timing,
            histogram: output.histogram,
            stats: output.stats,
        })
    }
}

/// Result of one benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    /// Input format
    pub format: FileFormat,
    /// Strategy used
    pub strategy: Strategy,
    /// Init and analyze durations
    pub timing: TimingRecord,
    /// Filled histogram
    pub histogram: Histogram1D,
    /// Entry counts
    pub stats: RunStats,
}
