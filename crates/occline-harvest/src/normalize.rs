//! Raw occurrence → canonical record mapping
//!
//! Pure, per-record, and infallible for missing *optional* fields: absent
//! values stay `None`/empty, never sentinel defaults. Records that cannot
//! carry their own identity or position are skipped with a reason.

use occline_gbif::raw::RawOccurrence;

use crate::record::{OccurrenceRecord, round5};

/// Why an individual raw record was dropped. A routine, counted
/// condition, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither `key` nor `gbifID` present
    MissingId,
    /// Latitude or longitude absent despite server-side filtering
    MissingCoordinates,
    /// Raw JSON did not match the occurrence shape
    Unparseable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "missing record identifier"),
            Self::MissingCoordinates => write!(f, "missing coordinates"),
            Self::Unparseable(e) => write!(f, "unparseable record: {e}"),
        }
    }
}

/// Drop empty-after-trim strings so "" never masquerades as data.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Map a raw occurrence onto the canonical schema.
///
/// `family` is the resolved family name and overrides whatever the raw
/// record carries, so output partitions always agree on the family.
pub fn normalize(raw: RawOccurrence, family: &str) -> Result<OccurrenceRecord, SkipReason> {
    let gbif_id = raw
        .key
        .map(|k| k.to_string())
        .or_else(|| non_empty(raw.gbif_id))
        .ok_or(SkipReason::MissingId)?;

    let (latitude, longitude) = match (raw.decimal_latitude, raw.decimal_longitude) {
        (Some(lat), Some(lon)) => (round5(lat), round5(lon)),
        _ => return Err(SkipReason::MissingCoordinates),
    };

    let media_urls: Vec<String> = raw
        .media
        .into_iter()
        .filter_map(|m| non_empty(m.identifier))
        .collect();

    let references: Vec<String> = raw
        .references
        .into_iter()
        .filter_map(|r| non_empty(r.citation).or_else(|| non_empty(r.identifier)))
        .collect();

    Ok(OccurrenceRecord {
        gbif_id,
        dataset_key: non_empty(raw.dataset_key),
        dataset_name: non_empty(raw.dataset_name),
        publishing_org_key: non_empty(raw.publishing_org_key),
        license: non_empty(raw.license),
        kingdom: non_empty(raw.kingdom),
        phylum: non_empty(raw.phylum),
        r#class: non_empty(raw.r#class),
        order: non_empty(raw.order),
        family: family.to_string(),
        genus: non_empty(raw.genus),
        species: non_empty(raw.species),
        scientific_name: non_empty(raw.scientific_name),
        accepted_scientific_name: non_empty(raw.accepted_scientific_name),
        taxon_key: raw.taxon_key,
        accepted_taxon_key: raw.accepted_taxon_key,
        taxon_rank: non_empty(raw.taxon_rank),
        specific_epithet: non_empty(raw.specific_epithet),
        event_date: non_empty(raw.event_date),
        year: raw.year,
        month: raw.month,
        day: raw.day,
        recorded_by: non_empty(raw.recorded_by),
        identified_by: non_empty(raw.identified_by),
        latitude,
        longitude,
        coordinate_uncertainty_m: raw.coordinate_uncertainty_in_meters,
        elevation: raw.elevation,
        elevation_accuracy: raw.elevation_accuracy,
        country: non_empty(raw.country),
        country_code: non_empty(raw.country_code),
        state_province: non_empty(raw.state_province),
        locality: non_empty(raw.locality),
        basis_of_record: non_empty(raw.basis_of_record),
        establishment_means: non_empty(raw.establishment_means),
        occurrence_status: non_empty(raw.occurrence_status),
        individual_count: raw.individual_count,
        life_stage: non_empty(raw.life_stage),
        sex: non_empty(raw.sex),
        media_urls,
        references,
        issues: raw.issues,
        modified: non_empty(raw.modified),
        last_interpreted: non_empty(raw.last_interpreted),
    })
}
