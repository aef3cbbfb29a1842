//! OccurrenceRecord slices → Arrow RecordBatch

use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Array, Int32Array, Int64Array, ListBuilder, RecordBatch, StringArray,
    StringBuilder,
};
use arrow::error::ArrowError;

use crate::record::OccurrenceRecord;
use crate::schema;

fn utf8<'a>(records: &'a [OccurrenceRecord], f: impl Fn(&'a OccurrenceRecord) -> Option<&'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter(records.iter().map(f)))
}

fn list_utf8<'a>(
    records: &'a [OccurrenceRecord],
    f: impl Fn(&'a OccurrenceRecord) -> &'a [String],
) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for record in records {
        for item in f(record) {
            builder.values().append_value(item);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

/// Build one RecordBatch for a partition. Column order must match
/// [`schema::occurrences`] exactly.
pub fn to_record_batch(records: &[OccurrenceRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.gbif_id.as_str()),
        )),
        utf8(records, |r| r.dataset_key.as_deref()),
        utf8(records, |r| r.dataset_name.as_deref()),
        utf8(records, |r| r.publishing_org_key.as_deref()),
        utf8(records, |r| r.license.as_deref()),
        utf8(records, |r| r.kingdom.as_deref()),
        utf8(records, |r| r.phylum.as_deref()),
        utf8(records, |r| r.r#class.as_deref()),
        utf8(records, |r| r.order.as_deref()),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.family.as_str()),
        )),
        utf8(records, |r| r.genus.as_deref()),
        utf8(records, |r| r.species.as_deref()),
        utf8(records, |r| r.scientific_name.as_deref()),
        utf8(records, |r| r.accepted_scientific_name.as_deref()),
        Arc::new(Int64Array::from_iter(records.iter().map(|r| r.taxon_key))),
        Arc::new(Int64Array::from_iter(
            records.iter().map(|r| r.accepted_taxon_key),
        )),
        utf8(records, |r| r.taxon_rank.as_deref()),
        utf8(records, |r| r.specific_epithet.as_deref()),
        utf8(records, |r| r.event_date.as_deref()),
        Arc::new(Int32Array::from_iter(records.iter().map(|r| r.year))),
        Arc::new(Int32Array::from_iter(records.iter().map(|r| r.month))),
        Arc::new(Int32Array::from_iter(records.iter().map(|r| r.day))),
        utf8(records, |r| r.recorded_by.as_deref()),
        utf8(records, |r| r.identified_by.as_deref()),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.latitude),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.longitude),
        )),
        Arc::new(Float64Array::from_iter(
            records.iter().map(|r| r.coordinate_uncertainty_m),
        )),
        Arc::new(Float64Array::from_iter(records.iter().map(|r| r.elevation))),
        Arc::new(Float64Array::from_iter(
            records.iter().map(|r| r.elevation_accuracy),
        )),
        utf8(records, |r| r.country.as_deref()),
        utf8(records, |r| r.country_code.as_deref()),
        utf8(records, |r| r.state_province.as_deref()),
        utf8(records, |r| r.locality.as_deref()),
        utf8(records, |r| r.basis_of_record.as_deref()),
        utf8(records, |r| r.establishment_means.as_deref()),
        utf8(records, |r| r.occurrence_status.as_deref()),
        Arc::new(Int32Array::from_iter(
            records.iter().map(|r| r.individual_count),
        )),
        utf8(records, |r| r.life_stage.as_deref()),
        utf8(records, |r| r.sex.as_deref()),
        list_utf8(records, |r| &r.media_urls),
        list_utf8(records, |r| &r.references),
        list_utf8(records, |r| &r.issues),
        utf8(records, |r| r.modified.as_deref()),
        utf8(records, |r| r.last_interpreted.as_deref()),
    ];

    RecordBatch::try_new(Arc::new(schema::occurrences().clone()), columns)
}
