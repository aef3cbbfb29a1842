//! Occline Core - Common infrastructure for the occurrence harvesting pipeline
//!
//! Blocking HTTP facade, logging/progress plumbing, and the output sinks
//! (Parquet + JSONL) shared by the harvest stages.

pub mod http;
pub mod logging;
pub mod progress;
pub mod sink;

// Re-exports for convenience
pub use http::{HttpError, backoff_duration, get_json, get_json_retry, head_ok};
pub use logging::init_logging;
pub use progress::ProgressContext;
pub use sink::{JsonlSink, ParquetSink, cleanup_tmp_files, is_valid_parquet};
