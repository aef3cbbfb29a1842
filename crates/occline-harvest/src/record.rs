//! Canonical record and catalog entry types

use serde::{Deserialize, Serialize};

/// Coordinate precision: 5 decimal places (~1 m at the equator)
pub fn round5(x: f64) -> f64 {
    (x * 100_000.0).round() / 100_000.0
}

/// Partition name for records without a genus
pub const UNKNOWN_GENUS: &str = "Unknown";

/// A normalized occurrence, the canonical unit of output.
///
/// Invariants: latitude/longitude are present and rounded to exactly
/// 5 decimals; `family` is always the resolved family name; `issues`
/// never intersects the policy deny-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub gbif_id: String,
    pub dataset_key: Option<String>,
    pub dataset_name: Option<String>,
    pub publishing_org_key: Option<String>,
    pub license: Option<String>,

    // Taxonomic rank chain
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub r#class: Option<String>,
    pub order: Option<String>,
    pub family: String,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub scientific_name: Option<String>,
    pub accepted_scientific_name: Option<String>,
    pub taxon_key: Option<i64>,
    pub accepted_taxon_key: Option<i64>,
    pub taxon_rank: Option<String>,
    pub specific_epithet: Option<String>,

    // Event
    pub event_date: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub recorded_by: Option<String>,
    pub identified_by: Option<String>,

    // Spatial
    pub latitude: f64,
    pub longitude: f64,
    pub coordinate_uncertainty_m: Option<f64>,
    pub elevation: Option<f64>,
    pub elevation_accuracy: Option<f64>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub state_province: Option<String>,
    pub locality: Option<String>,

    // Provenance
    pub basis_of_record: Option<String>,
    pub establishment_means: Option<String>,
    pub occurrence_status: Option<String>,
    pub individual_count: Option<i32>,
    pub life_stage: Option<String>,
    pub sex: Option<String>,

    // List-valued
    pub media_urls: Vec<String>,
    pub references: Vec<String>,
    pub issues: Vec<String>,

    // Timestamps
    pub modified: Option<String>,
    pub last_interpreted: Option<String>,
}

impl OccurrenceRecord {
    /// Genus partition name; missing genus groups under `Unknown`.
    pub fn genus_partition(&self) -> &str {
        self.genus.as_deref().unwrap_or(UNKNOWN_GENUS)
    }

    /// Composite dedup key: (scientific name, event date, lat@5dp,
    /// lon@5dp, dataset key). Coordinates are already rounded, so
    /// integer micro-degrees compare exactly. Absence is part of the key.
    pub fn dedup_key(&self) -> RecordKey {
        RecordKey {
            scientific_name: self.scientific_name.clone(),
            event_date: self.event_date.clone(),
            lat_e5: (self.latitude * 100_000.0).round() as i64,
            lon_e5: (self.longitude * 100_000.0).round() as i64,
            dataset_key: self.dataset_key.clone(),
        }
    }
}

/// Content key under which duplicates collapse
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub scientific_name: Option<String>,
    pub event_date: Option<String>,
    pub lat_e5: i64,
    pub lon_e5: i64,
    pub dataset_key: Option<String>,
}

/// Dataset catalog entry, created on first observation and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub key: String,
    pub title: Option<String>,
    pub publishing_org_key: Option<String>,
    pub license: Option<String>,
    pub citation: String,
}

/// Taxon catalog entry, keyed by accepted-taxon key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxon {
    pub key: i64,
    pub accepted_scientific_name: Option<String>,
    pub rank: Option<String>,
    pub genus: Option<String>,
    pub specific_epithet: Option<String>,
    /// Extensible, starts empty
    pub synonyms: Vec<String>,
    pub vernacular_names: Vec<String>,
}
