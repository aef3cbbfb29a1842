//! Permissive serde schema for GBIF API responses
//!
//! Occurrence search results are kept as raw `serde_json::Value` items in
//! [`SearchPage`] and parsed one at a time into [`RawOccurrence`], so a
//! single malformed record becomes a counted skip instead of failing the
//! whole page.

use serde::Deserialize;

/// One page of `/occurrence/search` results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Total matching records reported by the server
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub end_of_records: bool,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// A single occurrence as GBIF returns it. Every field is optional;
/// interpretation happens in the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOccurrence {
    pub key: Option<i64>,
    #[serde(rename = "gbifID")]
    pub gbif_id: Option<String>,
    pub dataset_key: Option<String>,
    pub dataset_name: Option<String>,
    pub publishing_org_key: Option<String>,
    pub license: Option<String>,

    // Taxonomic rank chain
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub r#class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
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
    pub decimal_latitude: Option<f64>,
    pub decimal_longitude: Option<f64>,
    pub coordinate_uncertainty_in_meters: Option<f64>,
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
    #[serde(default)]
    pub media: Vec<RawMedia>,
    #[serde(default)]
    pub references: Vec<RawReference>,
    #[serde(default)]
    pub issues: Vec<String>,

    // Timestamps
    pub modified: Option<String>,
    pub last_interpreted: Option<String>,
}

/// Media attachment; only the URL matters downstream
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedia {
    pub identifier: Option<String>,
}

/// Bibliographic reference attached to an occurrence
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReference {
    pub citation: Option<String>,
    pub identifier: Option<String>,
}

/// Response of `/species/search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesSearchResponse {
    #[serde(default)]
    pub results: Vec<NameUsage>,
}

/// Candidate name usage from the species search
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameUsage {
    pub key: Option<i64>,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub rank: Option<String>,
    #[serde(alias = "status")]
    pub taxonomic_status: Option<String>,
}
