//! # Filter-Aggregate Pipeline
//!
//! An analysis is an ordered list of [`Stage`]s followed by one histogram
//! fill. Stages are evaluated per entry and short-circuit: an entry rejected
//! at stage `k` never reaches stage `k + 1`.
//!
//! Two execution strategies run the same compiled stage list:
//!
//! - [`Strategy::Declarative`] composes a lazy [`Frame`] whose terminal
//!   [`LazyHisto::materialize`] evaluates every node stage-at-a-time over a
//!   per-batch selection vector
//! - [`Strategy::Explicit`] is a hand-written batch loop with a row loop
//!   inside it and an early `continue` on the first failing stage
//!
//! Both produce identical histograms and [`RunStats`].
//!
//! ## Malformed entries
//!
//! An entry whose list column holds the wrong number of elements is skipped
//! and counted in [`RunStats::entries_malformed`]. If every entry read was
//! malformed the run fails with [`PipelineError::AllEntriesMalformed`].
//! Inconsistent list offsets are always fatal.

mod explicit;
mod frame;
mod stage;

pub use frame::{Frame, LazyHisto};
pub use stage::{CmpOp, Derived, Stage, Verdict};

pub(crate) use stage::{Scratch, Step};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::histogram::{Binning, Histogram1D, HistogramError};
use crate::reader::{ColumnSource, ReaderError};
use crate::schema::ColumnSpec;
use crate::timing::FirstEntryMark;

/// Errors raised while building or running a pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage reads a column missing from the declared column list
    #[error("Stage reads undeclared column: {0}")]
    UndeclaredColumn(String),

    /// A stage reads a column of the wrong shape
    #[error("Column {column} is {found}, stage needs {expected}")]
    ColumnKind {
        /// Column name
        column: String,
        /// Shape the stage needs
        expected: String,
        /// Declared column
        found: String,
    },

    /// Two stages define the same slot
    #[error("Slot defined twice: {0}")]
    DuplicateSlot(String),

    /// The histogram fills from a slot nothing defines
    #[error("Histogram fills from undefined slot: {0}")]
    UnknownSlot(String),

    /// Per-track momentum column lists of different lengths
    #[error("Slot {slot} has {px} px, {py} py and {pz} pz columns")]
    TrackMismatch {
        /// Slot name
        slot: String,
        /// Number of px columns
        px: usize,
        /// Number of py columns
        py: usize,
        /// Number of pz columns
        pz: usize,
    },

    /// Every entry read had a malformed list
    #[error("All {entries} entries read were malformed; check the column configuration")]
    AllEntriesMalformed {
        /// Number of entries read
        entries: u64,
    },

    /// Histogram error
    #[error("Histogram error: {0}")]
    Histogram(#[from] HistogramError),

    /// Reader error
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),
}

/// How a pipeline walks its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lazily composed frame, evaluated by the terminal histogram action
    #[default]
    Declarative,
    /// Batch loop with a row loop inside it
    Explicit,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Declarative => write!(f, "declarative"),
            Strategy::Explicit => write!(f, "explicit"),
        }
    }
}

/// Entry counts of one run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunStats {
    /// Entries fetched from the source
    pub entries_read: u64,
    /// Entries that cleared every stage and were filled
    pub entries_passed: u64,
    /// Entries skipped for a list of the wrong length
    pub entries_malformed: u64,
    /// Entries rejected by each stage, in stage order
    pub rejected: Vec<u64>,
}

impl RunStats {
    pub(crate) fn new(stages: usize) -> Self {
        Self {
            rejected: vec![0; stages],
            ..Self::default()
        }
    }

    /// Record `verdict` of stage `idx`; true when the entry continues
    #[inline]
    pub(crate) fn record(&mut self, idx: usize, verdict: Verdict) -> bool {
        match verdict {
            Verdict::Pass => true,
            Verdict::Reject => {
                self.rejected[idx] += 1;
                false
            }
            Verdict::Malformed => {
                self.entries_malformed += 1;
                false
            }
        }
    }

    /// Fail when every entry read was malformed
    pub(crate) fn check(&self) -> Result<(), PipelineError> {
        if self.entries_read > 0 && self.entries_malformed == self.entries_read {
            return Err(PipelineError::AllEntriesMalformed {
                entries: self.entries_read,
            });
        }
        Ok(())
    }
}

/// Histogram and counts produced by a run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Filled histogram
    pub histogram: Histogram1D,
    /// Entry counts
    pub stats: RunStats,
}

/// A compiled stage list bound to a column declaration and a binning
#[derive(Debug, Clone)]
pub struct Pipeline {
    columns: Vec<ColumnSpec>,
    stages: Vec<Stage>,
    steps: Vec<Step>,
    slots: Vec<String>,
    fill_slot: usize,
    binning: Binning,
}

impl Pipeline {
    /// Compile `stages` against `columns`, filling `binning` from `fill`.
    ///
    /// Fails if a stage reads an undeclared column or a column of the wrong
    /// shape, or if `fill` is not defined by any stage.
    pub fn new(
        columns: Vec<ColumnSpec>,
        stages: Vec<Stage>,
        fill: &str,
        binning: Binning,
    ) -> Result<Self, PipelineError> {
        let (steps, slots, fill_slot) = compile(&columns, &stages, fill)?;
        // Validate up front so a bad binning fails before any I/O
        Histogram1D::from_binning(&binning)?;
        Ok(Self {
            columns,
            stages,
            steps,
            slots,
            fill_slot,
            binning,
        })
    }

    /// Declared columns, in binding order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Stages, in evaluation order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Slot names, in definition order
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Name of the slot the histogram is filled from
    pub fn fill_slot(&self) -> &str {
        &self.slots[self.fill_slot]
    }

    /// Histogram binning
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Run over `source` with `strategy`, stamping `mark` at the first entry
    pub fn run(
        &self,
        source: ColumnSource,
        strategy: Strategy,
        mark: &FirstEntryMark,
    ) -> Result<PipelineOutput, PipelineError> {
        log::debug!(
            "Running {} stages over {:?} with the {} strategy",
            self.stages.len(),
            source.origin(),
            strategy
        );
        match strategy {
            Strategy::Declarative => {
                let mut frame = Frame::new(source, self.columns.clone()).mark(mark);
                for stage in &self.stages {
                    frame = match stage {
                        Stage::Define { slot, derived } => frame.define(slot, derived.clone()),
                        filter => frame.filter(filter.clone()),
                    };
                }
                frame.histo1d(self.binning.clone(), self.fill_slot())?.materialize()
            }
            Strategy::Explicit => explicit::run(self, source, mark),
        }
    }
}

/// Compile stages and locate the fill slot
pub(crate) fn compile(
    columns: &[ColumnSpec],
    stages: &[Stage],
    fill: &str,
) -> Result<(Vec<Step>, Vec<String>, usize), PipelineError> {
    let mut slots = Vec::new();
    let steps = stages
        .iter()
        .map(|stage| Step::compile(stage, columns, &mut slots))
        .collect::<Result<Vec<_>, _>>()?;
    let fill_slot = slots
        .iter()
        .position(|s| s == fill)
        .ok_or_else(|| PipelineError::UnknownSlot(fill.to_string()))?;
    Ok((steps, slots, fill_slot))
}
