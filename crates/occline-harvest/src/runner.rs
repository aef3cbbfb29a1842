//! Harvest orchestration: resolve → page → filter → normalize →
//! catalog → dedup → write → validate → report
//!
//! A single linear pass per invocation. Nothing is written until the full
//! deduplicated set is known, so partial output never looks authoritative.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use occline_core::ProgressContext;
use occline_core::progress::fmt_num;
use occline_gbif::pager::{HttpPageSource, PageSource, Pager};
use occline_gbif::raw::RawOccurrence;
use occline_gbif::resolver::{ResolvedTaxon, resolve_family};

use crate::catalog::CatalogBuilder;
use crate::dedup::Deduplicator;
use crate::media::{MediaValidator, ValidationResult};
use crate::normalize::{SkipReason, normalize};
use crate::policy::QualityPolicy;
use crate::report::{QualityReporter, RunCounters};
use crate::writer::{PartitionedWriter, RunLock};

/// Configuration for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: String,
    pub family: String,
    /// Directory name of the partitioned output under the root
    pub dataset_name: String,
    pub output_root: PathBuf,
    /// Cap on kept (filtered + normalized) records
    pub max_records: usize,
    pub page_size: u64,
    pub page_delay: Duration,
    pub zstd_level: i32,
    pub media_sample_size: usize,
    pub media_per_record_cap: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: occline_gbif::GBIF_API_BASE.to_string(),
            family: "Cactaceae".to_string(),
            dataset_name: "cactaceae".to_string(),
            output_root: PathBuf::from("./data"),
            max_records: 10_000,
            page_size: 300,
            page_delay: Duration::from_millis(500),
            zstd_level: 3,
            media_sample_size: 100,
            media_per_record_cap: 3,
        }
    }
}

/// What one run did, for the caller's log.
#[derive(Debug)]
pub struct RunSummary {
    pub taxon_key: i64,
    pub total_available: u64,
    pub counters: RunCounters,
    pub unique_records: usize,
    pub partitions: usize,
    pub validation: ValidationResult,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!(
            "Harvest complete: {} unique records across {} partitions \
             ({} fetched, {} filtered, {} skipped, {} duplicates) in {:.1}s",
            fmt_num(self.unique_records),
            self.partitions,
            fmt_num(self.counters.fetched),
            self.counters.filtered_out,
            self.counters.skipped,
            self.counters.duplicates,
            self.elapsed.as_secs_f64()
        );
        log::info!(
            "Media sample: {}/{} URLs accessible ({:.1}%)",
            self.validation.accessible,
            self.validation.checked,
            self.validation.success_rate()
        );
    }
}

/// Run the full pipeline against the live API.
pub fn run(config: &HarvestConfig, progress: &ProgressContext) -> Result<RunSummary> {
    // Resolution failure aborts before any output I/O
    let taxon = resolve_family(&config.base_url, &config.family)?;
    let policy = QualityPolicy::default();
    let source = HttpPageSource::new(&config.base_url, policy.search_params(taxon.key));
    run_with_source(config, progress, taxon, &policy, source)
}

/// Pipeline body, generic over the page source so tests can drive it
/// with scripted pages.
pub fn run_with_source<S: PageSource>(
    config: &HarvestConfig,
    progress: &ProgressContext,
    taxon: ResolvedTaxon,
    policy: &QualityPolicy,
    source: S,
) -> Result<RunSummary> {
    let start = Instant::now();

    // Single-writer contract over the output root for the whole run
    let _lock = RunLock::acquire(&config.output_root)?;
    let writer =
        PartitionedWriter::new(&config.output_root, &config.dataset_name, config.zstd_level);
    writer.sweep_stale_tmp()?;

    let mut pager = Pager::new(source, config.page_size, config.page_delay);
    let mut dedup = Deduplicator::new();
    let mut catalog = CatalogBuilder::new();
    let mut counters = RunCounters::default();

    let pb = progress.stage_line("harvest");
    log::info!(
        "Harvesting up to {} records for {} (taxon key {})",
        fmt_num(config.max_records),
        taxon.family,
        taxon.key
    );

    while dedup.len() < config.max_records {
        let page = pager
            .next_page()
            .context("occurrence paging failed")?;
        let Some(page) = page else { break };

        counters.fetched += page.results.len();
        for item in page.results {
            if dedup.len() >= config.max_records {
                break;
            }
            let raw: RawOccurrence = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(e) => {
                    counters.skipped += 1;
                    let reason = SkipReason::Unparseable(e.to_string());
                    log::debug!("skipping record: {reason}");
                    continue;
                }
            };
            if let Some(flag) = policy.denied_issue(&raw.issues) {
                counters.filtered_out += 1;
                log::debug!("excluding record with denied issue {flag}");
                continue;
            }
            match normalize(raw, &taxon.family) {
                Ok(record) => {
                    catalog.observe(&record);
                    if !dedup.push(record) {
                        counters.duplicates += 1;
                    }
                }
                Err(reason) => {
                    counters.skipped += 1;
                    log::debug!("skipping record: {reason}");
                }
            }
        }
        pb.set_message(format!(
            "{} kept / {} fetched (of ~{})",
            fmt_num(dedup.len()),
            fmt_num(counters.fetched),
            pager.total_available().map_or_else(|| "?".to_string(), |n| fmt_num(n as usize)),
        ));
    }
    pb.finish_and_clear();
    log::debug!("paging done after {} pages", pager.pages_fetched());

    let total_available = pager.total_available().unwrap_or(0);
    if dedup.is_empty() {
        log::warn!("No records survived filtering; output will be empty");
    }
    let records = dedup.into_records();

    let write_pb = progress.stage_line("write");
    write_pb.set_message("writing partitions...");
    let partitions = writer.write_all(&records)?;
    catalog.write(&config.output_root)?;
    write_pb.finish_and_clear();

    let media_pb = progress.stage_line("media");
    media_pb.set_message("checking sampled media links...");
    let validator = MediaValidator {
        sample_size: config.media_sample_size,
        per_record_cap: config.media_per_record_cap,
        ..Default::default()
    };
    let validation = validator.validate(&records);
    media_pb.finish_and_clear();

    let report = QualityReporter::default().build(
        &taxon.family,
        &records,
        &catalog,
        validation.clone(),
        counters,
    );
    report.write(&config.output_root)?;

    let summary = RunSummary {
        taxon_key: taxon.key,
        total_available,
        counters,
        unique_records: records.len(),
        partitions: partitions.len(),
        validation,
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}
