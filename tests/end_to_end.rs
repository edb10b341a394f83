//! End-to-end benchmark runs over synthetic Parquet files.

mod common;

use colbench::analysis::{AnalysisConfig, AnalysisKind};
use colbench::benchmark::{BenchmarkError, BenchmarkRun};
use colbench::format::FileFormat;
use colbench::pipeline::{PipelineError, Strategy};
use colbench::reader::ReaderConfig;
use tempfile::tempdir;

use common::{
    dimuon_batch, dimuon_events, three_body_batch, with_large_lists, write_parquet, write_sidecar,
};

#[test]
fn test_dimuon_strategies_agree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Run2012B_DoubleMuParked.parquet");
    let events = dimuon_events(500);
    let batch = dimuon_batch(&events);
    write_parquet(&path, &batch, 128);
    write_sidecar(&path, &batch);

    let analysis = AnalysisConfig::for_kind(AnalysisKind::Dimuon);
    let run = BenchmarkRun::new(&path, analysis).with_reader(ReaderConfig::default().with_batch_size(50));
    let declarative = run.clone().with_strategy(Strategy::Declarative).run().unwrap();
    let explicit = run.with_strategy(Strategy::Explicit).run().unwrap();

    assert_eq!(declarative.format, FileFormat::Parquet);
    assert_eq!(declarative.histogram, explicit.histogram);
    assert_eq!(declarative.stats, explicit.stats);

    let selected = events.iter().filter(|e| e.selected()).count() as u64;
    assert_eq!(declarative.stats.entries_read, 500);
    assert_eq!(declarative.stats.entries_passed, selected);
    assert_eq!(declarative.histogram.entries(), selected);
}

#[test]
fn test_materialize_matches_streaming() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("B2HHH.parquet");
    let batch = three_body_batch(1000);
    write_parquet(&path, &batch, 300);
    write_sidecar(&path, &batch);

    let run = BenchmarkRun::new(&path, AnalysisConfig::for_kind(AnalysisKind::ThreeBody));
    let streaming = run.clone().run().unwrap();
    let materialized = run.with_materialize(true).run().unwrap();
    assert_eq!(streaming.histogram, materialized.histogram);
    assert_eq!(streaming.stats, materialized.stats);
    assert!(streaming.stats.entries_passed > 0);
    assert!(streaming.stats.entries_passed < 1000);
}

#[test]
fn test_three_body_rejections_sum_up() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("B2HHH.parquet");
    write_parquet(&path, &three_body_batch(400), 1000);

    let report = BenchmarkRun::new(&path, AnalysisConfig::for_kind(AnalysisKind::ThreeBody))
        .with_strategy(Strategy::Explicit)
        .run()
        .unwrap();
    let stats = &report.stats;
    assert_eq!(stats.rejected.len(), 10);
    assert_eq!(
        stats.rejected.iter().sum::<u64>() + stats.entries_passed + stats.entries_malformed,
        stats.entries_read
    );
}

#[test]
fn test_histogram_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.parquet");
    write_parquet(&path, &dimuon_batch(&dimuon_events(64)), 1000);

    let report = BenchmarkRun::new(&path, AnalysisConfig::default()).run().unwrap();
    let csv = dir.path().join("mass.csv");
    report.histogram.export(&csv).unwrap();
    let text = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 2001);
}

#[test]
fn test_timing_is_well_defined_for_empty_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.parquet");
    write_parquet(&path, &dimuon_batch(&[]), 1000);

    let report = BenchmarkRun::new(&path, AnalysisConfig::default()).run().unwrap();
    assert_eq!(report.stats.entries_read, 0);
    assert_eq!(report.timing.analyze_us, 0);
    assert_eq!(report.histogram.entries(), 0);
}

#[test]
fn test_wrong_analysis_for_file_is_schema_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.parquet");
    write_parquet(&path, &dimuon_batch(&dimuon_events(10)), 1000);

    let err = BenchmarkRun::new(&path, AnalysisConfig::for_kind(AnalysisKind::ThreeBody))
        .run()
        .unwrap_err();
    match err {
        BenchmarkError::Reader(e) => assert!(e.is_schema_error()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_all_malformed_fails_the_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    let mut events: Vec<_> = dimuon_events(16)
        .into_iter()
        .filter(|e| e.charge.len() == 2)
        .collect();
    for event in &mut events {
        event.pt.truncate(1);
    }
    // Keep every event past the charge cut so each one reaches the mass
    for event in &mut events {
        event.charge = vec![1, -1];
    }
    write_parquet(&path, &dimuon_batch(&events), 1000);

    let err = BenchmarkRun::new(&path, AnalysisConfig::default()).run().unwrap_err();
    assert!(matches!(
        err,
        BenchmarkError::Pipeline(PipelineError::AllEntriesMalformed { .. })
    ));
}

#[test]
fn test_zero_batch_size_from_config_file_reads_every_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("B2HHH.parquet");
    write_parquet(&path, &three_body_batch(30), 1000);

    let reader: ReaderConfig = toml::from_str("batch_size = 0").unwrap();
    let analysis = AnalysisConfig::for_kind(AnalysisKind::ThreeBody);
    let zero = BenchmarkRun::new(&path, analysis.clone())
        .with_reader(reader)
        .run()
        .unwrap();
    let reference = BenchmarkRun::new(&path, analysis).run().unwrap();

    assert_eq!(zero.stats.entries_read, 30);
    assert_eq!(zero.stats, reference.stats);
    assert_eq!(zero.histogram, reference.histogram);
}

#[test]
fn test_large_list_columns_match_list_columns() {
    let dir = tempdir().unwrap();
    let small = dir.path().join("small.parquet");
    let large = dir.path().join("large.parquet");
    let batch = dimuon_batch(&dimuon_events(200));
    write_parquet(&small, &batch, 64);
    write_parquet(&large, &with_large_lists(&batch), 64);

    let analysis = AnalysisConfig::for_kind(AnalysisKind::Dimuon);
    let reference = BenchmarkRun::new(&small, analysis.clone()).run().unwrap();
    let run = BenchmarkRun::new(&large, analysis);
    let declarative = run.clone().with_strategy(Strategy::Declarative).run().unwrap();
    let explicit = run.with_strategy(Strategy::Explicit).run().unwrap();

    assert_eq!(declarative.histogram, explicit.histogram);
    assert_eq!(declarative.stats, explicit.stats);
    assert_eq!(declarative.histogram, reference.histogram);
    assert_eq!(declarative.stats, reference.stats);
    assert!(declarative.stats.entries_passed > 0);
}
