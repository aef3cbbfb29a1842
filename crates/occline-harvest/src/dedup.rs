//! Content-based deduplication, first-seen wins

use rustc_hash::FxHashSet;

use crate::record::{OccurrenceRecord, RecordKey};

/// Folds normalized records into a unique, order-preserving set.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: FxHashSet<RecordKey>,
    records: Vec<OccurrenceRecord>,
    dropped: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the record unless its composite key was already observed.
    /// Returns true if the record was kept.
    pub fn push(&mut self, record: OccurrenceRecord) -> bool {
        if self.seen.insert(record.dedup_key()) {
            self.records.push(record);
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Unique records kept so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Duplicates silently dropped (surfaced in the run log only)
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Final unique set, in first-seen order
    pub fn into_records(self) -> Vec<OccurrenceRecord> {
        self.records
    }
}
