//! Synthetic event files shared by the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, Int32Array, ListArray, UInt32Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float32Type, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use oxyroot::{RootFile, WriterTree};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

/// Muon multiplicities cycled through by [`dimuon_events`]
const COUNTS: [u32; 8] = [2, 2, 1, 2, 3, 0, 2, 2];

/// One synthetic dimuon event
#[derive(Debug, Clone)]
pub struct DimuonEvent {
    pub charge: Vec<i32>,
    pub pt: Vec<f32>,
    pub eta: Vec<f32>,
    pub phi: Vec<f32>,
}

impl DimuonEvent {
    pub fn count(&self) -> u32 {
        self.charge.len() as u32
    }

    /// Whether the event clears the muon-count and charge cuts
    pub fn selected(&self) -> bool {
        self.charge.len() == 2 && self.charge[0] != self.charge[1]
    }
}

/// Deterministic events with a mix of multiplicities and charge pairings
pub fn dimuon_events(n: usize) -> Vec<DimuonEvent> {
    (0..n)
        .map(|i| {
            let count = COUNTS[i % COUNTS.len()] as usize;
            let same_sign = i % 5 == 0;
            let charge = (0..count)
                .map(|j| if j % 2 == 0 || same_sign { 1 } else { -1 })
                .collect();
            let pt = (0..count).map(|j| 5.0 + ((i * 7 + j * 11) % 60) as f32).collect();
            let eta = (0..count)
                .map(|j| ((i * 13 + j * 17) % 48) as f32 / 10.0 - 2.4)
                .collect();
            let phi = (0..count)
                .map(|j| ((i * 31 + j * 97) % 628) as f32 / 100.0 - 3.0)
                .collect();
            DimuonEvent {
                charge,
                pt,
                eta,
                phi,
            }
        })
        .collect()
}

fn float_list(values: impl Iterator<Item = Vec<f32>>) -> ArrayRef {
    Arc::new(ListArray::from_iter_primitive::<Float32Type, _, _>(
        values.map(|v| Some(v.into_iter().map(Some))),
    ))
}

/// CMS-style batch: unsigned muon count plus per-muon lists
pub fn dimuon_batch(events: &[DimuonEvent]) -> RecordBatch {
    let count = UInt32Array::from_iter_values(events.iter().map(DimuonEvent::count));
    let charge = ListArray::from_iter_primitive::<Int32Type, _, _>(
        events
            .iter()
            .map(|e| Some(e.charge.iter().copied().map(Some).collect::<Vec<_>>())),
    );
    let mass = events.iter().map(|e| vec![0.105_658_f32; e.pt.len()]);
    let run = Int32Array::from_iter_values(events.iter().map(|_| 194_050));
    RecordBatch::try_from_iter(vec![
        ("run", Arc::new(run) as ArrayRef),
        ("nMuon", Arc::new(count) as ArrayRef),
        ("Muon_pt", float_list(events.iter().map(|e| e.pt.clone()))),
        ("Muon_eta", float_list(events.iter().map(|e| e.eta.clone()))),
        ("Muon_phi", float_list(events.iter().map(|e| e.phi.clone()))),
        ("Muon_mass", float_list(mass)),
        ("Muon_charge", Arc::new(charge) as ArrayRef),
    ])
    .unwrap()
}

/// The same batch with every `List` column widened to `LargeList`
pub fn with_large_lists(batch: &RecordBatch) -> RecordBatch {
    let mut fields = Vec::new();
    let mut columns = Vec::new();
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        match field.data_type() {
            DataType::List(item) => {
                let large = DataType::LargeList(item.clone());
                columns.push(cast(column, &large).unwrap());
                fields.push(Field::new(field.name(), large, field.is_nullable()));
            }
            _ => {
                columns.push(column.clone());
                fields.push(field.as_ref().clone());
            }
        }
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
}

/// Uniform value in `[0, 1)` derived from `x` (splitmix64)
pub fn unit(x: u64) -> f64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

/// LHCb-style batch of three-track candidates
pub fn three_body_batch(n: usize) -> RecordBatch {
    let mut columns: Vec<(String, ArrayRef)> = Vec::new();
    for (t, track) in ["H1", "H2", "H3"].iter().enumerate() {
        let seed = move |i: usize| (i * 3 + t) as u64;
        columns.push((
            format!("{track}_isMuon"),
            Arc::new(Int32Array::from_iter_values(
                (0..n).map(|i| i32::from(seed(i) % 11 == 0)),
            )),
        ));
        columns.push((
            format!("{track}_ProbK"),
            Arc::new(Float64Array::from_iter_values(
                (0..n).map(|i| unit(seed(i) * 8 + 1)),
            )),
        ));
        columns.push((
            format!("{track}_ProbPi"),
            Arc::new(Float64Array::from_iter_values(
                (0..n).map(|i| unit(seed(i) * 8 + 2)),
            )),
        ));
        columns.push((
            format!("{track}_PX"),
            Arc::new(Float64Array::from_iter_values(
                (0..n).map(|i| (unit(seed(i) * 8 + 3) - 0.5) * 3000.0),
            )),
        ));
        columns.push((
            format!("{track}_PY"),
            Arc::new(Float64Array::from_iter_values(
                (0..n).map(|i| (unit(seed(i) * 8 + 4) - 0.5) * 3000.0),
            )),
        ));
        columns.push((
            format!("{track}_PZ"),
            Arc::new(Float64Array::from_iter_values(
                (0..n).map(|i| 2000.0 + unit(seed(i) * 8 + 5) * 40000.0),
            )),
        ));
    }
    columns.push((
        "B_FlightDistance".to_string(),
        Arc::new(Float32Array::from_iter_values((0..n).map(|i| i as f32 * 0.01))),
    ));
    RecordBatch::try_from_iter(columns).unwrap()
}

/// Write `batch` as Parquet with at most `row_group_size` rows per group
pub fn write_parquet(path: &Path, batch: &RecordBatch, row_group_size: usize) {
    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

/// Write the sidecar column list next to `path`, listing every column of `batch`
pub fn write_sidecar(path: &Path, batch: &RecordBatch) {
    let text = path.to_string_lossy();
    let (basename, _) = colbench::format::split_path(&text);
    let names: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    colbench::format::write_column_names(colbench::format::sidecar_path(basename), &names).unwrap();
}

/// Write `batch` as ORC
pub fn write_orc(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = orc_rust::ArrowWriterBuilder::new(file, batch.schema())
        .try_build()
        .unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

/// Write `events` as a CMS-style ROOT tree with an unsigned muon count
pub fn write_root_dimuon(path: &Path, tree_name: &str, events: &[DimuonEvent]) {
    let mut file = RootFile::create(path).unwrap();
    let mut tree = WriterTree::new(tree_name);

    let counts: Vec<u32> = events.iter().map(DimuonEvent::count).collect();
    let charges: Vec<Vec<i32>> = events.iter().map(|e| e.charge.clone()).collect();
    let pts: Vec<Vec<f32>> = events.iter().map(|e| e.pt.clone()).collect();
    let etas: Vec<Vec<f32>> = events.iter().map(|e| e.eta.clone()).collect();
    let phis: Vec<Vec<f32>> = events.iter().map(|e| e.phi.clone()).collect();
    let masses: Vec<Vec<f32>> = events.iter().map(|e| vec![0.105_658_f32; e.pt.len()]).collect();

    tree.new_branch("nMuon", counts.into_iter());
    tree.new_branch("Muon_charge", charges.into_iter());
    tree.new_branch("Muon_pt", pts.into_iter());
    tree.new_branch("Muon_eta", etas.into_iter());
    tree.new_branch("Muon_phi", phis.into_iter());
    tree.new_branch("Muon_mass", masses.into_iter());
    tree.write(&mut file).unwrap();
    file.close().unwrap();
}
