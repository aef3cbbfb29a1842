//! Reference catalogs accumulated as records are observed
//!
//! Insert-if-absent only: re-processing a record never overwrites or
//! duplicates an existing entry, so observation order does not matter
//! and pre- vs post-dedup observation yields the same catalogs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::record::{Dataset, OccurrenceRecord, Taxon};

/// Incremental dataset/taxon catalogs for one run.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    datasets: BTreeMap<String, Dataset>,
    taxa: BTreeMap<String, Taxon>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one record, creating catalog entries on first sight.
    pub fn observe(&mut self, record: &OccurrenceRecord) {
        if let Some(key) = &record.dataset_key {
            if !self.datasets.contains_key(key) {
                let title = record.dataset_name.clone();
                let citation = format!(
                    "{} (accessed via GBIF.org)",
                    title.as_deref().unwrap_or(key)
                );
                self.datasets.insert(
                    key.clone(),
                    Dataset {
                        key: key.clone(),
                        title,
                        publishing_org_key: record.publishing_org_key.clone(),
                        license: record.license.clone(),
                        citation,
                    },
                );
            }
        }

        if let Some(key) = record.accepted_taxon_key {
            let map_key = key.to_string();
            self.taxa.entry(map_key).or_insert_with(|| Taxon {
                key,
                accepted_scientific_name: record.accepted_scientific_name.clone(),
                rank: record.taxon_rank.clone(),
                genus: record.genus.clone(),
                specific_epithet: record.specific_epithet.clone(),
                synonyms: Vec::new(),
                vernacular_names: Vec::new(),
            });
        }
    }

    pub fn datasets(&self) -> &BTreeMap<String, Dataset> {
        &self.datasets
    }

    pub fn taxa(&self) -> &BTreeMap<String, Taxon> {
        &self.taxa
    }

    /// Write both catalogs under `<root>/catalog/`.
    pub fn write(&self, root: &Path) -> Result<()> {
        let dir = root.join("catalog");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create catalog dir: {}", dir.display()))?;

        let datasets_path = dir.join("datasets.json");
        let file = fs::File::create(&datasets_path)
            .with_context(|| format!("failed to create {}", datasets_path.display()))?;
        serde_json::to_writer_pretty(file, &self.datasets)
            .with_context(|| format!("failed to write {}", datasets_path.display()))?;

        let taxa_path = dir.join("taxa.json");
        let file = fs::File::create(&taxa_path)
            .with_context(|| format!("failed to create {}", taxa_path.display()))?;
        serde_json::to_writer_pretty(file, &self.taxa)
            .with_context(|| format!("failed to write {}", taxa_path.display()))?;

        log::info!(
            "Wrote catalogs: {} datasets, {} taxa",
            self.datasets.len(),
            self.taxa.len()
        );
        Ok(())
    }
}
