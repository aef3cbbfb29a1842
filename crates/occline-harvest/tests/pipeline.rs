//! End-to-end pipeline tests driven by scripted page sources
//!
//! The live-network test at the bottom is #[ignore]d by default.
//! Run with: cargo test -p occline-harvest --test pipeline -- --ignored

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tempfile::TempDir;

use occline_core::{HttpError, ProgressContext};
use occline_gbif::pager::PageSource;
use occline_gbif::raw::SearchPage;
use occline_gbif::resolver::ResolvedTaxon;
use occline_harvest::{HarvestConfig, QualityPolicy, run_with_source};

fn occurrence(
    key: i64,
    genus: Option<&str>,
    name: &str,
    date: &str,
    lat: f64,
    lon: f64,
    dataset: &str,
    issues: &[&str],
) -> serde_json::Value {
    serde_json::json!({
        "key": key,
        "datasetKey": dataset,
        "datasetName": format!("Dataset {dataset}"),
        "license": "CC0_1_0",
        "genus": genus,
        "scientificName": name,
        "eventDate": date,
        "decimalLatitude": lat,
        "decimalLongitude": lon,
        "basisOfRecord": "HUMAN_OBSERVATION",
        "issues": issues,
    })
}

fn page(results: Vec<serde_json::Value>, count: u64, end: bool) -> SearchPage {
    SearchPage {
        count,
        end_of_records: end,
        results,
    }
}

/// Scripted page source; counts fetches so tests can assert paging stopped.
struct ScriptedSource {
    pages: Vec<SearchPage>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(mut pages: Vec<SearchPage>) -> (Self, Arc<AtomicUsize>) {
        pages.reverse();
        let fetches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                pages,
                fetches: fetches.clone(),
            },
            fetches,
        )
    }
}

impl PageSource for ScriptedSource {
    fn fetch(&mut self, _offset: u64, _limit: u64) -> Result<SearchPage, HttpError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.pop().unwrap_or_else(|| page(Vec::new(), 0, true)))
    }
}

fn config(dir: &TempDir, max_records: usize) -> HarvestConfig {
    HarvestConfig {
        family: "Cactaceae".to_string(),
        dataset_name: "cactaceae".to_string(),
        output_root: dir.path().to_path_buf(),
        max_records,
        page_size: 300,
        page_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn taxon() -> ResolvedTaxon {
    ResolvedTaxon {
        key: 2519,
        family: "Cactaceae".to_string(),
    }
}

fn run_pipeline(
    dir: &TempDir,
    max_records: usize,
    pages: Vec<SearchPage>,
) -> (occline_harvest::RunSummary, Arc<AtomicUsize>) {
    let (source, fetches) = ScriptedSource::new(pages);
    let progress = ProgressContext::new();
    let summary = run_with_source(
        &config(dir, max_records),
        &progress,
        taxon(),
        &QualityPolicy::default(),
        source,
    )
    .expect("pipeline should succeed");
    (summary, fetches)
}

fn partition_dirs(dir: &TempDir, format: &str) -> BTreeSet<String> {
    let path = dir.path().join("cactaceae").join(format);
    std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn full_run_filters_dedups_and_partitions() {
    let dir = TempDir::new().unwrap();
    let pages = vec![
        page(
            vec![
                occurrence(1, Some("Opuntia"), "Opuntia ficus-indica", "2021-05-04", -23.55, -46.63, "d-1", &[]),
                // Denied issue: must not appear anywhere in the output
                occurrence(2, Some("Cereus"), "Cereus jamacaru", "2021-06-01", -8.05, -34.9, "d-1", &["ZERO_COORDINATE"]),
                // Missing genus: goes to the Unknown partition
                occurrence(3, None, "Cactaceae sp.", "2020-01-01", 19.43, -99.13, "d-2", &[]),
            ],
            5,
            false,
        ),
        page(
            vec![
                // Same content key as record 1, different source key: duplicate
                occurrence(9, Some("Opuntia"), "Opuntia ficus-indica", "2021-05-04", -23.55, -46.63, "d-1", &[]),
                occurrence(5, Some("Cereus"), "Cereus jamacaru", "2021-06-02", -8.05, -34.9, "d-1", &[]),
            ],
            5,
            true,
        ),
    ];

    let (summary, _) = run_pipeline(&dir, 100, pages);

    assert_eq!(summary.counters.fetched, 5);
    assert_eq!(summary.counters.filtered_out, 1);
    assert_eq!(summary.counters.duplicates, 1);
    assert_eq!(summary.unique_records, 3);
    assert_eq!(summary.partitions, 3);
    assert_eq!(summary.total_available, 5);

    // Partition completeness: written dirs equal the genus set, both formats
    let expected: BTreeSet<String> = ["genus=Cereus", "genus=Opuntia", "genus=Unknown"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(partition_dirs(&dir, "parquet"), expected);
    assert_eq!(partition_dirs(&dir, "jsonl"), expected);

    // The denied record is in no partition file
    for entry in std::fs::read_dir(dir.path().join("cactaceae/jsonl")).unwrap() {
        let file = entry.unwrap().path().join("part-0001.jsonl");
        let content = std::fs::read_to_string(file).unwrap();
        assert!(!content.contains("\"gbif_id\":\"2\""));
        assert!(!content.contains("ZERO_COORDINATE"));
    }

    // First-seen record survived dedup, not the later duplicate
    let opuntia = std::fs::read_to_string(
        dir.path().join("cactaceae/jsonl/genus=Opuntia/part-0001.jsonl"),
    )
    .unwrap();
    assert_eq!(opuntia.lines().count(), 1);
    assert!(opuntia.contains("\"gbif_id\":\"1\""));

    // Catalogs and report written; lock released
    assert!(dir.path().join("catalog/datasets.json").exists());
    assert!(dir.path().join("catalog/taxa.json").exists());
    assert!(dir.path().join("reports/quality_summary.md").exists());
    assert!(!dir.path().join(".occline.lock").exists());
}

#[test]
fn stops_at_max_records_not_total_available() {
    // Server reports 1000 matches; cap is 50 kept records
    let dir = TempDir::new().unwrap();
    let first: Vec<serde_json::Value> = (0..300)
        .map(|i| {
            occurrence(
                i,
                Some("Opuntia"),
                &format!("Opuntia sp. {i}"),
                "2021-01-01",
                i as f64 / 100.0,
                0.0,
                "d-1",
                &[],
            )
        })
        .collect();
    let second: Vec<serde_json::Value> = (300..600)
        .map(|i| {
            occurrence(
                i,
                Some("Opuntia"),
                &format!("Opuntia sp. {i}"),
                "2021-01-01",
                i as f64 / 100.0,
                0.0,
                "d-1",
                &[],
            )
        })
        .collect();
    let pages = vec![page(first, 1000, false), page(second, 1000, false)];

    let (summary, fetches) = run_pipeline(&dir, 50, pages);

    assert_eq!(summary.unique_records, 50);
    assert_eq!(summary.total_available, 1000);
    // One page of 300 was enough; no further fetches
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_records_is_success_with_empty_output() {
    let dir = TempDir::new().unwrap();
    let (summary, _) = run_pipeline(&dir, 100, vec![page(Vec::new(), 0, true)]);

    assert_eq!(summary.unique_records, 0);
    assert_eq!(summary.partitions, 0);
    assert!(!dir.path().join("cactaceae/parquet").exists());
    // Catalogs and report are still written
    assert!(dir.path().join("catalog/datasets.json").exists());
    assert!(dir.path().join("reports/quality_summary.md").exists());
}

#[test]
fn malformed_record_skipped_run_continues() {
    let dir = TempDir::new().unwrap();
    let mut results = vec![occurrence(1, Some("Opuntia"), "Opuntia sp.", "2021-01-01", 1.0, 2.0, "d-1", &[])];
    // year with the wrong type fails the per-record parse
    results.push(serde_json::json!({"key": 2, "year": "not a year"}));
    // missing coordinates is a normalize-time skip
    results.push(serde_json::json!({"key": 3, "genus": "Cereus"}));

    let (summary, _) = run_pipeline(&dir, 100, vec![page(results, 3, true)]);

    assert_eq!(summary.counters.fetched, 3);
    assert_eq!(summary.counters.skipped, 2);
    assert_eq!(summary.unique_records, 1);
}

#[test]
fn partition_write_failure_is_fatal_and_names_partition() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(&dir, 100);
    // zstd rejects levels beyond 22, so the first partition write fails
    cfg.zstd_level = 99;
    let pages = vec![page(
        vec![occurrence(1, Some("Opuntia"), "Opuntia sp.", "2021-01-01", 1.0, 2.0, "d-1", &[])],
        1,
        true,
    )];
    let (source, _) = ScriptedSource::new(pages);
    let progress = ProgressContext::new();

    let err = run_with_source(&cfg, &progress, taxon(), &QualityPolicy::default(), source)
        .unwrap_err();

    assert!(format!("{err:#}").contains("failed to write partition genus=Opuntia"));
    // No report for an aborted run, and the lock is released
    assert!(!dir.path().join("reports/quality_summary.md").exists());
    assert!(!dir.path().join(".occline.lock").exists());
}

/// Live harvest against the real GBIF API.
/// Run with: cargo test -p occline-harvest --test pipeline -- --ignored live_small_harvest
#[test]
#[ignore]
fn live_small_harvest() {
    let dir = TempDir::new().unwrap();
    let config = HarvestConfig {
        output_root: dir.path().to_path_buf(),
        max_records: 50,
        page_size: 50,
        media_sample_size: 5,
        ..Default::default()
    };
    let progress = ProgressContext::new();
    let summary = occline_harvest::run(&config, &progress).expect("live harvest should succeed");

    assert!(summary.unique_records > 0);
    assert!(dir.path().join("cactaceae/parquet").exists());
    assert!(dir.path().join("reports/quality_summary.md").exists());
}
