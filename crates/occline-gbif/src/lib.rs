//! Occline GBIF - taxonomy lookup and paged occurrence search
//!
//! Raw response schemas stay permissive (all fields optional); the
//! normalizer downstream is the only place that interprets them.

pub mod pager;
pub mod raw;
pub mod resolver;

/// GBIF public API base URL
pub const GBIF_API_BASE: &str = "https://api.gbif.org/v1";

pub use pager::{HttpPageSource, PageSource, Pager};
pub use raw::{RawMedia, RawOccurrence, SearchPage};
pub use resolver::{ResolutionError, ResolvedTaxon, resolve_family};
