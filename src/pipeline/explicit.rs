//! Explicit execution: batch loop, row loop, early `continue`.

use crate::histogram::Histogram1D;
use crate::reader::ColumnSource;
use crate::timing::FirstEntryMark;
use crate::view::EntryBatch;

use super::{Pipeline, PipelineError, PipelineOutput, RunStats, Scratch};

pub(super) fn run(
    pipeline: &Pipeline,
    mut source: ColumnSource,
    mark: &FirstEntryMark,
) -> Result<PipelineOutput, PipelineError> {
    let mut histogram = Histogram1D::from_binning(&pipeline.binning)?;
    let mut stats = RunStats::new(pipeline.steps.len());
    let mut scratch = Scratch::default();
    let mut slots = vec![f64::NAN; pipeline.slots.len()];
    let mut first = true;

    while let Some(batch) = source.next_batch() {
        let batch = batch?;
        let view = EntryBatch::bind(&batch, &pipeline.columns)?;
        let rows = view.num_rows();
        stats.entries_read += rows as u64;

        'rows: for row in 0..rows {
            if first {
                mark.stamp();
                first = false;
            }
            let entry = view.entry(row);
            for (idx, step) in pipeline.steps.iter().enumerate() {
                let verdict = step.eval(&entry, &mut slots, &mut scratch)?;
                if !stats.record(idx, verdict) {
                    continue 'rows;
                }
            }
            histogram.fill(slots[pipeline.fill_slot]);
            stats.entries_passed += 1;
        }
    }

    log::debug!(
        "Read {} batches, {} entries",
        source.batches_read(),
        source.rows_read()
    );
    stats.check()?;
    Ok(PipelineOutput { histogram, stats })
}
