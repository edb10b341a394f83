//! Declarative execution: a lazily composed frame evaluated by its terminal
//! histogram action.

use crate::histogram::{Binning, Histogram1D};
use crate::reader::ColumnSource;
use crate::schema::ColumnSpec;
use crate::timing::FirstEntryMark;
use crate::view::EntryBatch;

use super::{compile, Derived, PipelineError, PipelineOutput, RunStats, Scratch, Stage, Step};

/// A lazy chain of stages over a column source.
///
/// Building a frame reads nothing. Evaluation happens once, when the
/// [`LazyHisto`] returned by [`Frame::histo1d`] is materialized.
///
/// ```rust,no_run
/// use colbench::format::FormatDescriptor;
/// use colbench::histogram::Binning;
/// use colbench::pipeline::{CmpOp, Frame, Stage};
/// use colbench::reader::{ColumnSource, ReaderConfig};
/// use colbench::schema::{ColumnSpec, ElementType};
/// use colbench::pipeline::Derived;
///
/// let columns = vec![
///     ColumnSpec::scalar("H1_ProbK", ElementType::Float64),
///     ColumnSpec::scalar("H1_PX", ElementType::Float64),
///     ColumnSpec::scalar("H1_PY", ElementType::Float64),
///     ColumnSpec::scalar("H1_PZ", ElementType::Float64),
/// ];
/// let descriptor = FormatDescriptor::from_path("B2HHH.parquet")?;
/// let source = ColumnSource::open(&descriptor, &columns, &ReaderConfig::default())?;
/// let output = Frame::new(source, columns)
///     .filter(Stage::cut("H1_ProbK", CmpOp::Gt, 0.5))
///     .define("K_m", Derived::CartesianFixedMass {
///         px: vec!["H1_PX".into()],
///         py: vec!["H1_PY".into()],
///         pz: vec!["H1_PZ".into()],
///         mass: 493.677,
///     })
///     .histo1d(Binning::new("K_m", 100, 0.0, 1000.0), "K_m")?
///     .materialize()?;
/// println!("{} entries filled", output.stats.entries_passed);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Frame<'m> {
    source: ColumnSource,
    columns: Vec<ColumnSpec>,
    mark: Option<&'m FirstEntryMark>,
    stages: Vec<Stage>,
}

impl<'m> Frame<'m> {
    /// Frame over `source`, binding `columns` in each batch
    pub fn new(source: ColumnSource, columns: Vec<ColumnSpec>) -> Self {
        Self {
            source,
            columns,
            mark: None,
            stages: Vec::new(),
        }
    }

    /// Head the chain with a node stamping `mark` when the first entry enters
    pub fn mark(mut self, mark: &'m FirstEntryMark) -> Self {
        self.mark = Some(mark);
        self
    }

    /// Append a stage
    pub fn filter(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a definition of `slot`
    pub fn define(mut self, slot: impl Into<String>, derived: Derived) -> Self {
        self.stages.push(Stage::Define {
            slot: slot.into(),
            derived,
        });
        self
    }

    /// Stages appended so far
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Terminal action: histogram `slot` with `binning`.
    ///
    /// Validates the chain but does not evaluate it.
    pub fn histo1d(self, binning: Binning, slot: &str) -> Result<LazyHisto<'m>, PipelineError> {
        let (steps, slots, fill_slot) = compile(&self.columns, &self.stages, slot)?;
        let histogram = Histogram1D::from_binning(&binning)?;
        Ok(LazyHisto {
            frame: self,
            steps,
            width: slots.len(),
            fill_slot,
            histogram,
        })
    }
}

/// A histogram whose upstream chain has not been evaluated yet
pub struct LazyHisto<'m> {
    frame: Frame<'m>,
    steps: Vec<Step>,
    width: usize,
    fill_slot: usize,
    histogram: Histogram1D,
}

impl LazyHisto<'_> {
    /// Evaluate the chain and fill the histogram.
    ///
    /// Per batch, each stage runs over the entries still selected, in
    /// declaration order, so every stage sees each surviving entry once.
    pub fn materialize(self) -> Result<PipelineOutput, PipelineError> {
        let LazyHisto {
            frame,
            steps,
            width,
            fill_slot,
            mut histogram,
        } = self;
        let Frame {
            source,
            columns,
            mark,
            ..
        } = frame;

        let mut stats = RunStats::new(steps.len());
        let mut scratch = Scratch::default();
        let mut selection: Vec<usize> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for batch in source {
            let batch = batch?;
            let view = EntryBatch::bind(&batch, &columns)?;
            let rows = view.num_rows();
            if rows == 0 {
                continue;
            }
            if let Some(mark) = mark {
                mark.stamp();
            }
            stats.entries_read += rows as u64;

            selection.clear();
            selection.extend(0..rows);
            values.clear();
            values.resize(rows * width, f64::NAN);

            for (idx, step) in steps.iter().enumerate() {
                let mut kept = 0;
                for i in 0..selection.len() {
                    let row = selection[i];
                    let slots = &mut values[row * width..(row + 1) * width];
                    let verdict = step.eval(&view.entry(row), slots, &mut scratch)?;
                    if stats.record(idx, verdict) {
                        selection[kept] = row;
                        kept += 1;
                    }
                }
                selection.truncate(kept);
                if selection.is_empty() {
                    break;
                }
            }

            for &row in &selection {
                histogram.fill(values[row * width + fill_slot]);
            }
            stats.entries_passed += selection.len() as u64;
        }

        stats.check()?;
        Ok(PipelineOutput { histogram, stats })
    }
}
