//! # colbench - Columnar Event Format Benchmark
//!
//! `colbench` measures how quickly physics event data can be read from three
//! columnar on-disk layouts and reduced to an invariant-mass histogram.
//!
//! ## Key Features
//!
//! - **Three layouts, one contract**: native ROOT trees, ORC stripes and
//!   Parquet row groups all arrive as Arrow record batches behind one
//!   [`reader::ColumnSource`].
//!
//! - **Zero-copy entry views**: scalar and variable-length list columns are
//!   read through typed views that borrow the batch buffers and bounds-check
//!   every list span.
//!
//! - **Two equivalent strategies**: a lazily composed declarative frame and
//!   a hand-written batch loop run the same stage list and produce identical
//!   histograms.
//!
//! - **Split timing**: time to the first usable entry is reported apart from
//!   the time spent processing every entry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colbench::analysis::{AnalysisConfig, AnalysisKind};
//! use colbench::benchmark::BenchmarkRun;
//! use colbench::pipeline::Strategy;
//!
//! let report = BenchmarkRun::new("Run2012B_DoubleMuParked.parquet", AnalysisConfig::for_kind(AnalysisKind::Dimuon))
//!     .with_strategy(Strategy::Explicit)
//!     .run()?;
//!
//! println!("{}", report.timing);
//! report.histogram.export("dimuon.csv")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`format`]: suffix dispatch and sidecar column lists
//! - [`reader`]: format-specific batch sources
//! - [`view`]: typed per-entry access to a batch
//! - [`pipeline`]: stages and the two execution strategies
//! - [`analysis`]: the dimuon and three-body analyses as configuration values
//! - [`kinematics`]: four-vector arithmetic
//! - [`histogram`]: fixed-width histogram and its export
//! - [`timing`]: init/analyze stopwatch
//! - [`benchmark`]: one timed run from path to histogram

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod analysis;
pub mod benchmark;
pub mod format;
pub mod histogram;
pub mod kinematics;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod timing;
pub mod view;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::analysis::{AnalysisConfig, AnalysisKind, DimuonConfig, ThreeBodyConfig};
    pub use crate::benchmark::{BenchmarkError, BenchmarkReport, BenchmarkRun};
    pub use crate::format::{FileFormat, FormatDescriptor, FormatError};
    pub use crate::histogram::{Binning, Histogram1D, HistogramError};
    pub use crate::pipeline::{
        CmpOp, Derived, Frame, LazyHisto, Pipeline, PipelineError, PipelineOutput, RunStats,
        Stage, Strategy, Verdict,
    };
    pub use crate::reader::{ColumnSource, ReaderConfig, ReaderError, SourceSummary};
    pub use crate::schema::{ColumnKind, ColumnSpec, ElementType};
    pub use crate::timing::{FirstEntryMark, Stopwatch, TimingRecord};
    pub use crate::view::{EntryBatch, ListView, ScalarView};
}
