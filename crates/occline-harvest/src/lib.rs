//! Occline Harvest - pipeline stages for the occurrence harvester
//!
//! Filtering, normalization, deduplication, catalogs, partitioned
//! persistence, media validation, reporting, and the orchestrator that
//! sequences them.

pub mod arrow_convert;
pub mod catalog;
pub mod dedup;
pub mod media;
pub mod normalize;
pub mod policy;
pub mod record;
pub mod report;
pub mod runner;
pub mod schema;
pub mod writer;

// Re-exports for convenience
pub use catalog::CatalogBuilder;
pub use dedup::Deduplicator;
pub use media::{MediaValidator, ValidationResult};
pub use normalize::{SkipReason, normalize};
pub use policy::QualityPolicy;
pub use record::{Dataset, OccurrenceRecord, Taxon, round5};
pub use report::{QualityReport, QualityReporter, RunCounters};
pub use runner::{HarvestConfig, RunSummary, run, run_with_source};
pub use writer::{PartitionedWriter, RunLock};
