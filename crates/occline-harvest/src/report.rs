//! Run statistics and the rendered quality summary
//!
//! Computed once over the final deduplicated set, after every other
//! stage; reads everything, mutates nothing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;

use crate::catalog::CatalogBuilder;
use crate::media::ValidationResult;
use crate::record::OccurrenceRecord;

/// Non-fatal per-record counters accumulated across the run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounters {
    /// Raw result items observed from the pager
    pub fetched: usize,
    /// Excluded by the issue deny-list
    pub filtered_out: usize,
    /// Skipped as malformed / unnormalizable
    pub skipped: usize,
    /// Dropped as duplicates
    pub duplicates: usize,
}

/// Aggregates over the final record set, ready to render.
#[derive(Debug)]
pub struct QualityReport {
    pub family: String,
    pub total_records: usize,
    pub counters: RunCounters,
    /// (license, count), descending by count
    pub license_counts: Vec<(String, usize)>,
    pub basis_counts: Vec<(String, usize)>,
    /// (dataset key, title, count), top N by contribution
    pub top_datasets: Vec<(String, Option<String>, usize)>,
    pub validation: ValidationResult,
}

/// Builds and renders the quality report.
#[derive(Debug, Clone, Copy)]
pub struct QualityReporter {
    pub top_datasets: usize,
}

impl Default for QualityReporter {
    fn default() -> Self {
        Self { top_datasets: 20 }
    }
}

/// Count frequencies of an optional attribute; absence counts under "unknown".
fn frequency<'a>(
    records: &'a [OccurrenceRecord],
    f: impl Fn(&'a OccurrenceRecord) -> Option<&'a str>,
) -> Vec<(String, usize)> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for record in records {
        *counts.entry(f(record).unwrap_or("unknown")).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    // Descending by count, key breaks ties for determinism
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

impl QualityReporter {
    pub fn build(
        &self,
        family: &str,
        records: &[OccurrenceRecord],
        catalog: &CatalogBuilder,
        validation: ValidationResult,
        counters: RunCounters,
    ) -> QualityReport {
        let license_counts = frequency(records, |r| r.license.as_deref());
        let basis_counts = frequency(records, |r| r.basis_of_record.as_deref());

        let top_datasets = frequency(records, |r| r.dataset_key.as_deref())
            .into_iter()
            .take(self.top_datasets)
            .map(|(key, count)| {
                let title = catalog
                    .datasets()
                    .get(&key)
                    .and_then(|d| d.title.clone());
                (key, title, count)
            })
            .collect();

        QualityReport {
            family: family.to_string(),
            total_records: records.len(),
            counters,
            license_counts,
            basis_counts,
            top_datasets,
            validation,
        }
    }
}

impl QualityReport {
    /// Render the report as a markdown document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let c = &self.counters;

        out.push_str(&format!("# Quality Summary - {}\n\n", self.family));
        out.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));

        out.push_str("## Overview\n\n");
        out.push_str(&format!("- Records in output: **{}**\n", self.total_records));
        out.push_str(&format!("- Raw records fetched: {}\n", c.fetched));
        out.push_str(&format!("- Excluded by issue flags: {}\n", c.filtered_out));
        out.push_str(&format!("- Skipped (malformed): {}\n", c.skipped));
        out.push_str(&format!("- Duplicates dropped: {}\n\n", c.duplicates));

        out.push_str("## Records by license\n\n");
        render_table(&mut out, "License", &self.license_counts);

        out.push_str("## Records by basis of record\n\n");
        render_table(&mut out, "Basis of record", &self.basis_counts);

        out.push_str(&format!(
            "## Top {} contributing datasets\n\n",
            self.top_datasets.len()
        ));
        out.push_str("| Rank | Dataset | Records |\n|---:|---|---:|\n");
        for (rank, (key, title, count)) in self.top_datasets.iter().enumerate() {
            let name = title.as_deref().unwrap_or(key);
            out.push_str(&format!("| {} | {} | {} |\n", rank + 1, name, count));
        }
        out.push('\n');

        out.push_str("## Media validation\n\n");
        let v = &self.validation;
        out.push_str(&format!("- Records sampled: {}\n", v.sampled_records));
        out.push_str(&format!("- URLs checked: {}\n", v.checked));
        out.push_str(&format!("- Accessible: {}\n", v.accessible));
        out.push_str(&format!("- Broken: {}\n", v.broken));
        out.push_str(&format!("- Success rate: {:.1}%\n\n", v.success_rate()));
        if !v.broken_urls.is_empty() {
            out.push_str("Broken URLs:\n\n");
            for url in &v.broken_urls {
                out.push_str(&format!("- {url}\n"));
            }
            out.push('\n');
        }

        out.push_str("## Field dictionary\n\n");
        out.push_str("| Field | Description |\n|---|---|\n");
        for (field, desc) in FIELD_DICTIONARY {
            out.push_str(&format!("| `{field}` | {desc} |\n"));
        }
        out.push('\n');
        out
    }

    /// Write the rendered document to `<root>/reports/quality_summary.md`.
    pub fn write(&self, root: &Path) -> Result<()> {
        let dir = root.join("reports");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create reports dir: {}", dir.display()))?;
        let path = dir.join("quality_summary.md");
        fs::write(&path, self.render())
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Wrote quality report to {}", path.display());
        Ok(())
    }
}

fn render_table(out: &mut String, header: &str, rows: &[(String, usize)]) {
    out.push_str(&format!("| {header} | Records |\n|---|---:|\n"));
    for (key, count) in rows {
        out.push_str(&format!("| {key} | {count} |\n"));
    }
    out.push('\n');
}

/// Canonical schema, described for report readers.
const FIELD_DICTIONARY: &[(&str, &str)] = &[
    ("gbif_id", "Stable source record identifier"),
    ("dataset_key", "Identifier of the contributing dataset"),
    ("dataset_name", "Title of the contributing dataset"),
    ("publishing_org_key", "Publishing organization identifier"),
    ("license", "Rights/license tag of the record"),
    ("kingdom", "Taxonomic kingdom"),
    ("phylum", "Taxonomic phylum"),
    ("class", "Taxonomic class"),
    ("order", "Taxonomic order"),
    ("family", "Resolved family name (constant per run)"),
    ("genus", "Genus; also the output partition key"),
    ("species", "Species name"),
    ("scientific_name", "Scientific name as recorded"),
    ("accepted_scientific_name", "Accepted scientific name"),
    ("taxon_key", "Taxon key of the recorded name"),
    ("accepted_taxon_key", "Taxon key of the accepted name"),
    ("taxon_rank", "Rank of the recorded name"),
    ("specific_epithet", "Species epithet"),
    ("event_date", "Observation/collection date (ISO string)"),
    ("year", "Event year"),
    ("month", "Event month"),
    ("day", "Event day"),
    ("recorded_by", "Who recorded the occurrence"),
    ("identified_by", "Who identified the organism"),
    ("latitude", "Decimal latitude, 5-decimal precision"),
    ("longitude", "Decimal longitude, 5-decimal precision"),
    ("coordinate_uncertainty_m", "Coordinate uncertainty in meters"),
    ("elevation", "Elevation in meters"),
    ("elevation_accuracy", "Elevation accuracy in meters"),
    ("country", "Country name"),
    ("country_code", "ISO country code"),
    ("state_province", "State or province"),
    ("locality", "Verbatim locality"),
    ("basis_of_record", "Nature of the evidence behind the record"),
    ("establishment_means", "How the organism came to be at the location"),
    ("occurrence_status", "Presence/absence status"),
    ("individual_count", "Number of individuals observed"),
    ("life_stage", "Life stage of the organism"),
    ("sex", "Sex of the organism"),
    ("media_urls", "Media reference URLs"),
    ("references", "Bibliographic references"),
    ("issues", "Quality-issue flags (deny-listed flags never appear)"),
    ("modified", "Source modification timestamp"),
    ("last_interpreted", "Last interpretation timestamp at the source"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use occline_gbif::raw::RawOccurrence;

    fn record(ds: &str, license: &str, basis: &str) -> OccurrenceRecord {
        let raw = RawOccurrence {
            key: Some(1),
            decimal_latitude: Some(1.0),
            decimal_longitude: Some(2.0),
            dataset_key: Some(ds.to_string()),
            dataset_name: Some(format!("Dataset {ds}")),
            license: Some(license.to_string()),
            basis_of_record: Some(basis.to_string()),
            ..Default::default()
        };
        crate::normalize::normalize(raw, "Cactaceae").unwrap()
    }

    fn build(records: &[OccurrenceRecord]) -> QualityReport {
        let mut catalog = CatalogBuilder::new();
        for r in records {
            catalog.observe(r);
        }
        QualityReporter::default().build(
            "Cactaceae",
            records,
            &catalog,
            ValidationResult::default(),
            RunCounters::default(),
        )
    }

    #[test]
    fn frequency_tables_sorted_by_count() {
        let records = vec![
            record("d-1", "CC0_1_0", "HUMAN_OBSERVATION"),
            record("d-1", "CC0_1_0", "HUMAN_OBSERVATION"),
            record("d-2", "CC_BY_4_0", "PRESERVED_SPECIMEN"),
        ];
        let report = build(&records);

        assert_eq!(report.total_records, 3);
        assert_eq!(report.license_counts[0], ("CC0_1_0".to_string(), 2));
        assert_eq!(report.basis_counts[0], ("HUMAN_OBSERVATION".to_string(), 2));
        assert_eq!(report.top_datasets[0].0, "d-1");
        assert_eq!(report.top_datasets[0].2, 2);
    }

    #[test]
    fn top_datasets_capped() {
        let records: Vec<_> = (0..30)
            .map(|i| record(&format!("d-{i}"), "CC0_1_0", "HUMAN_OBSERVATION"))
            .collect();
        let report = build(&records);
        assert_eq!(report.top_datasets.len(), 20);
    }

    #[test]
    fn dataset_titles_come_from_catalog() {
        let report = build(&[record("d-7", "CC0_1_0", "HUMAN_OBSERVATION")]);
        assert_eq!(report.top_datasets[0].1.as_deref(), Some("Dataset d-7"));
    }

    #[test]
    fn missing_license_counts_as_unknown() {
        let mut r = record("d-1", "CC0_1_0", "HUMAN_OBSERVATION");
        r.license = None;
        let report = build(&[r]);
        assert_eq!(report.license_counts[0].0, "unknown");
    }

    #[test]
    fn render_contains_all_sections() {
        let report = build(&[record("d-1", "CC0_1_0", "HUMAN_OBSERVATION")]);
        let doc = report.render();
        for section in [
            "# Quality Summary - Cactaceae",
            "## Overview",
            "## Records by license",
            "## Records by basis of record",
            "contributing datasets",
            "## Media validation",
            "## Field dictionary",
        ] {
            assert!(doc.contains(section), "missing section: {section}");
        }
        assert!(doc.contains("| `latitude` |"));
    }

    #[test]
    fn write_creates_report_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = build(&[record("d-1", "CC0_1_0", "HUMAN_OBSERVATION")]);
        report.write(dir.path()).unwrap();
        assert!(dir.path().join("reports/quality_summary.md").exists());
    }
}
