use super::*;
use crate::format::FormatDescriptor;
use crate::schema::{ColumnSpec, ElementType};
use crate::view::{ListView, ScalarView};

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, LargeListArray, ListArray, UInt32Array};
use arrow::datatypes::{Float32Type, Int32Type};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::tempdir;

fn muon_batch(rows: usize) -> RecordBatch {
    let counts = UInt32Array::from_iter_values((0..rows).map(|i| (i % 3) as u32));
    let pts = ListArray::from_iter_primitive::<Float32Type, _, _>(
        (0..rows).map(|i| Some((0..i % 3).map(move |j| Some((i * 10 + j) as f32)))),
    );
    let charges = ListArray::from_iter_primitive::<Int32Type, _, _>(
        (0..rows).map(|i| Some((0..i % 3).map(|j| Some(if j % 2 == 0 { 1 } else { -1 })))),
    );
    let weight = Float32Array::from_iter_values((0..rows).map(|i| i as f32 * 0.5));
    RecordBatch::try_from_iter(vec![
        ("nMuon", Arc::new(counts) as ArrayRef),
        ("Muon_pt", Arc::new(pts) as ArrayRef),
        ("Muon_charge", Arc::new(charges) as ArrayRef),
        ("weight", Arc::new(weight) as ArrayRef),
    ])
    .unwrap()
}

fn write_parquet(path: &Path, batch: &RecordBatch, row_group_size: usize) {
    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), batch.schema(), Some(props)).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

fn muon_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::scalar("nMuon", ElementType::Int32),
        ColumnSpec::list("Muon_pt", ElementType::Float32),
    ]
}

#[test]
fn test_parquet_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("muons.parquet");
    write_parquet(&path, &muon_batch(10), 100);

    let descriptor = FormatDescriptor::from_path(&path)?;
    let columns = muon_columns();
    let mut source = ColumnSource::open(&descriptor, &columns, &ReaderConfig::default())?;
    assert_eq!(source.origin(), SourceOrigin::File(FileFormat::Parquet));

    let batch = source.next_batch().expect("one batch")?;
    assert!(source.next_batch().is_none());
    assert_eq!(batch.num_rows(), 10);

    let counts = ScalarView::<Int32Type>::bind(&batch, "nMuon")?;
    let pts = ListView::<Float32Type>::bind(&batch, "Muon_pt")?;
    for row in 0..10 {
        let n = row % 3;
        assert_eq!(counts.value(row), n as i32);
        let expected: Vec<f32> = (0..n).map(|j| (row * 10 + j) as f32).collect();
        assert_eq!(pts.exact(row, n)?, expected.as_slice());
    }
    Ok(())
}

#[test]
fn test_batches_never_span_row_groups() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("groups.parquet");
    write_parquet(&path, &muon_batch(10), 4);

    let descriptor = FormatDescriptor::from_path(&path)?;
    let source = ColumnSource::open(&descriptor, &muon_columns(), &ReaderConfig::default())?;
    let sizes: Vec<usize> = source
        .map(|b| b.map(|b| b.num_rows()))
        .collect::<Result<_, _>>()?;
    assert_eq!(sizes, vec![4, 4, 2]);

    let config = ReaderConfig::default().with_batch_size(3);
    let mut source = ColumnSource::open(&descriptor, &muon_columns(), &config)?;
    let mut sizes = Vec::new();
    while let Some(batch) = source.next_batch() {
        sizes.push(batch?.num_rows());
    }
    assert_eq!(sizes, vec![3, 1, 3, 1, 2]);
    assert_eq!(source.batches_read(), 5);
    assert_eq!(source.rows_read(), 10);
    Ok(())
}

#[test]
fn test_projection_reads_declared_and_listed_columns() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("proj.parquet");
    write_parquet(&path, &muon_batch(5), 100);
    let descriptor = FormatDescriptor::from_path(&path)?;

    let source = ColumnSource::open(&descriptor, &muon_columns(), &ReaderConfig::default())?;
    let names: Vec<String> = source.schema().fields().iter().map(|f| f.name().clone()).collect();
    assert_eq!(names, ["nMuon", "Muon_pt"]);

    let source = ColumnSource::open_projected(
        &descriptor,
        &muon_columns(),
        &["weight"],
        &ReaderConfig::default(),
    )?;
    let names: Vec<String> = source.schema().fields().iter().map(|f| f.name().clone()).collect();
    assert_eq!(names, ["nMuon", "Muon_pt", "weight"]);
    Ok(())
}

#[test]
fn test_schema_errors_at_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.parquet");
    write_parquet(&path, &muon_batch(5), 100);
    let descriptor = FormatDescriptor::from_path(&path).unwrap();

    let missing = [ColumnSpec::scalar("Muon_eta", ElementType::Float32)];
    let err = ColumnSource::open(&descriptor, &missing, &ReaderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, ReaderError::ColumnNotFound(ref c) if c == "Muon_eta"));

    let wrong_width = [ColumnSpec::list("Muon_pt", ElementType::Float64)];
    let err = ColumnSource::open(&descriptor, &wrong_width, &ReaderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, ReaderError::TypeMismatch { .. }));
    assert!(err.is_schema_error());

    let not_a_list = [ColumnSpec::list("weight", ElementType::Float32)];
    assert!(ColumnSource::open(&descriptor, &not_a_list, &ReaderConfig::default()).is_err());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let descriptor = FormatDescriptor::from_path(dir.path().join("absent.parquet")).unwrap();
    let err = ColumnSource::open(&descriptor, &muon_columns(), &ReaderConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, ReaderError::IoError(_)));
}

#[test]
fn test_materialize_yields_one_table() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("table.parquet");
    write_parquet(&path, &muon_batch(10), 3);
    let descriptor = FormatDescriptor::from_path(&path)?;

    let source = ColumnSource::open(&descriptor, &muon_columns(), &ReaderConfig::default())?;
    let mut table = source.materialize()?;
    assert_eq!(table.origin(), SourceOrigin::Table);
    let batch = table.next_batch().expect("table batch")?;
    assert_eq!(batch.num_rows(), 10);
    assert!(table.next_batch().is_none());

    let pts = ListView::<Float32Type>::bind(&batch, "Muon_pt")?;
    assert_eq!(pts.value(8)?, &[80.0, 81.0]);
    Ok(())
}

#[test]
fn test_empty_table_has_no_batches() {
    let batch = muon_batch(0);
    let mut source = ColumnSource::from_table(batch.schema(), &[batch]).unwrap();
    assert!(source.next_batch().is_none());
}

#[test]
fn test_inspect_parquet() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("inspect.parquet");
    write_parquet(&path, &muon_batch(9), 4);
    let descriptor = FormatDescriptor::from_path(&path)?;

    let summary = inspect(&descriptor, &ReaderConfig::default())?;
    assert_eq!(summary.entries, 9);
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.format, "parquet");
    assert_eq!(summary.column_names(), ["nMuon", "Muon_pt", "Muon_charge", "weight"]);
    assert!(summary.file_size > 0);
    assert!(summary.to_string().contains("Entries: 9"));
    Ok(())
}

#[test]
fn test_zero_batch_size_from_toml_reads_every_row() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("zero.parquet");
    write_parquet(&path, &muon_batch(10), 4);
    let descriptor = FormatDescriptor::from_path(&path)?;

    let config: ReaderConfig = toml::from_str("batch_size = 0")?;
    assert_eq!(config.batch_rows(), 1);
    let source = ColumnSource::open(&descriptor, &muon_columns(), &config)?;
    let sizes: Vec<usize> = source
        .map(|b| b.map(|b| b.num_rows()))
        .collect::<Result<_, _>>()?;
    assert_eq!(sizes.len(), 10);
    assert!(sizes.iter().all(|&n| n == 1));
    Ok(())
}

#[test]
fn test_large_list_columns_read_through_views() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("large.parquet");
    let counts = UInt32Array::from(vec![2, 0, 1]);
    let pts = LargeListArray::from_iter_primitive::<Float32Type, _, _>(vec![
        Some(vec![Some(20.0), Some(25.0)]),
        Some(vec![]),
        Some(vec![Some(7.5)]),
    ]);
    let batch = RecordBatch::try_from_iter(vec![
        ("nMuon", Arc::new(counts) as ArrayRef),
        ("Muon_pt", Arc::new(pts) as ArrayRef),
    ])?;
    write_parquet(&path, &batch, 100);
    let descriptor = FormatDescriptor::from_path(&path)?;

    let mut source = ColumnSource::open(&descriptor, &muon_columns(), &ReaderConfig::default())?;
    let batch = source.next_batch().expect("one batch")?;
    let pts = ListView::<Float32Type>::bind(&batch, "Muon_pt")?;
    assert_eq!(pts.exact(0, 2)?, &[20.0, 25.0]);
    assert!(pts.value(1)?.is_empty());
    assert_eq!(pts.value(2)?, &[7.5]);
    Ok(())
}
