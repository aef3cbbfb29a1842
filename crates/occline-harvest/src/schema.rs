//! Arrow schema for the canonical occurrence record
//!
//! Field order follows [`crate::record::OccurrenceRecord`]; the JSONL
//! serialization carries the identical field set.

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

pub static OCCURRENCES: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        // === Identity & provenance ===
        Field::new("gbif_id", DataType::Utf8, false),
        Field::new("dataset_key", DataType::Utf8, true),
        Field::new("dataset_name", DataType::Utf8, true),
        Field::new("publishing_org_key", DataType::Utf8, true),
        Field::new("license", DataType::Utf8, true),
        // === Taxonomy ===
        Field::new("kingdom", DataType::Utf8, true),
        Field::new("phylum", DataType::Utf8, true),
        Field::new("class", DataType::Utf8, true),
        Field::new("order", DataType::Utf8, true),
        Field::new("family", DataType::Utf8, false),
        Field::new("genus", DataType::Utf8, true),
        Field::new("species", DataType::Utf8, true),
        Field::new("scientific_name", DataType::Utf8, true),
        Field::new("accepted_scientific_name", DataType::Utf8, true),
        Field::new("taxon_key", DataType::Int64, true),
        Field::new("accepted_taxon_key", DataType::Int64, true),
        Field::new("taxon_rank", DataType::Utf8, true),
        Field::new("specific_epithet", DataType::Utf8, true),
        // === Event ===
        Field::new("event_date", DataType::Utf8, true),
        Field::new("year", DataType::Int32, true),
        Field::new("month", DataType::Int32, true),
        Field::new("day", DataType::Int32, true),
        Field::new("recorded_by", DataType::Utf8, true),
        Field::new("identified_by", DataType::Utf8, true),
        // === Spatial ===
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("coordinate_uncertainty_m", DataType::Float64, true),
        Field::new("elevation", DataType::Float64, true),
        Field::new("elevation_accuracy", DataType::Float64, true),
        Field::new("country", DataType::Utf8, true),
        Field::new("country_code", DataType::Utf8, true),
        Field::new("state_province", DataType::Utf8, true),
        Field::new("locality", DataType::Utf8, true),
        // === Record nature ===
        Field::new("basis_of_record", DataType::Utf8, true),
        Field::new("establishment_means", DataType::Utf8, true),
        Field::new("occurrence_status", DataType::Utf8, true),
        Field::new("individual_count", DataType::Int32, true),
        Field::new("life_stage", DataType::Utf8, true),
        Field::new("sex", DataType::Utf8, true),
        // === List-valued ===
        Field::new("media_urls", list_utf8(), true),
        Field::new("references", list_utf8(), true),
        Field::new("issues", list_utf8(), true),
        // === Timestamps ===
        Field::new("modified", DataType::Utf8, true),
        Field::new("last_interpreted", DataType::Utf8, true),
    ]))
});

/// Helper: create List<Utf8> type
fn list_utf8() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

pub fn occurrences() -> &'static Schema {
    &OCCURRENCES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_expected_fields() {
        let schema = occurrences();
        assert!(schema.field_with_name("gbif_id").is_ok());
        assert!(schema.field_with_name("latitude").is_ok());
        assert!(schema.field_with_name("media_urls").is_ok());
        assert!(schema.field_with_name("issues").is_ok());
    }

    #[test]
    fn mandatory_fields_are_non_nullable() {
        let schema = occurrences();
        for name in ["gbif_id", "family", "latitude", "longitude"] {
            assert!(
                !schema.field_with_name(name).unwrap().is_nullable(),
                "{name} must be non-nullable"
            );
        }
    }
}
