//! Family name → canonical GBIF taxon key

use occline_core::{HttpError, get_json_retry};

use crate::raw::{NameUsage, SpeciesSearchResponse};

/// Candidates requested from the species search
const SEARCH_LIMIT: u64 = 20;

/// Outcome of resolving a family name
#[derive(Debug, Clone)]
pub struct ResolvedTaxon {
    pub key: i64,
    /// Canonical family name, stamped into every output record
    pub family: String,
}

/// Failure to map a family name to a taxon key. Fatal: the run cannot
/// proceed without one, and nothing is written before resolution.
#[derive(Debug)]
pub enum ResolutionError {
    NoMatch { query: String },
    Remote(HttpError),
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatch { query } => {
                write!(f, "no accepted taxon found for family '{query}'")
            }
            Self::Remote(e) => write!(f, "taxonomy lookup failed: {e}"),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// How a candidate was selected
#[derive(Debug)]
pub enum Pick<'a> {
    /// Exact accepted match: returned family equals the query, status ACCEPTED
    Exact(&'a NameUsage),
    /// First candidate whose scientific name contains the query string
    Fallback(&'a NameUsage),
}

/// Selection rule over the candidate list, separated from I/O for testing.
pub fn pick_candidate<'a>(query: &str, candidates: &'a [NameUsage]) -> Option<Pick<'a>> {
    let exact = candidates.iter().find(|c| {
        c.key.is_some()
            && c.family.as_deref() == Some(query)
            && c.taxonomic_status.as_deref() == Some("ACCEPTED")
    });
    if let Some(c) = exact {
        return Some(Pick::Exact(c));
    }
    candidates
        .iter()
        .find(|c| {
            c.key.is_some()
                && c.scientific_name
                    .as_deref()
                    .is_some_and(|n| n.contains(query))
        })
        .map(Pick::Fallback)
}

/// Resolve a family name against `{base}/species/search?rank=FAMILY`.
pub fn resolve_family(base_url: &str, family: &str) -> Result<ResolvedTaxon, ResolutionError> {
    let url = format!("{base_url}/species/search");
    let query = [
        ("q", family.to_string()),
        ("rank", "FAMILY".to_string()),
        ("limit", SEARCH_LIMIT.to_string()),
    ];
    let resp: SpeciesSearchResponse =
        get_json_retry(&url, &query, 1).map_err(ResolutionError::Remote)?;

    match pick_candidate(family, &resp.results) {
        Some(Pick::Exact(c)) => {
            let key = c.key.ok_or_else(|| ResolutionError::NoMatch {
                query: family.to_string(),
            })?;
            log::info!("Resolved family {family} to taxon key {key}");
            Ok(ResolvedTaxon {
                key,
                family: family.to_string(),
            })
        }
        Some(Pick::Fallback(c)) => {
            let key = c.key.ok_or_else(|| ResolutionError::NoMatch {
                query: family.to_string(),
            })?;
            log::warn!(
                "No exact accepted match for {family}; falling back to '{}' (key {key})",
                c.scientific_name.as_deref().unwrap_or("?")
            );
            Ok(ResolvedTaxon {
                key,
                family: family.to_string(),
            })
        }
        None => Err(ResolutionError::NoMatch {
            query: family.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(key: i64, name: &str, family: Option<&str>, status: &str) -> NameUsage {
        NameUsage {
            key: Some(key),
            scientific_name: Some(name.to_string()),
            family: family.map(String::from),
            rank: Some("FAMILY".to_string()),
            taxonomic_status: Some(status.to_string()),
        }
    }

    #[test]
    fn exact_accepted_match_wins() {
        let candidates = vec![
            usage(1, "Cactaceae Juss.", Some("Cactaceae"), "SYNONYM"),
            usage(2, "Cactaceae Juss.", Some("Cactaceae"), "ACCEPTED"),
        ];
        match pick_candidate("Cactaceae", &candidates) {
            Some(Pick::Exact(c)) => assert_eq!(c.key, Some(2)),
            other => panic!("expected exact pick, got {other:?}"),
        }
    }

    #[test]
    fn substring_fallback_when_no_accepted() {
        let candidates = vec![usage(7, "Cactaceae Juss.", None, "SYNONYM")];
        match pick_candidate("Cactaceae", &candidates) {
            Some(Pick::Fallback(c)) => assert_eq!(c.key, Some(7)),
            other => panic!("expected fallback pick, got {other:?}"),
        }
    }

    #[test]
    fn no_match_at_all() {
        let candidates = vec![usage(1, "Orchidaceae", Some("Orchidaceae"), "ACCEPTED")];
        assert!(pick_candidate("NotAFamily", &candidates).is_none());
    }

    #[test]
    fn empty_candidate_list() {
        assert!(pick_candidate("Cactaceae", &[]).is_none());
    }

    #[test]
    fn candidate_without_key_is_skipped() {
        let mut c = usage(1, "Cactaceae", Some("Cactaceae"), "ACCEPTED");
        c.key = None;
        assert!(pick_candidate("Cactaceae", &[c]).is_none());
    }

    #[test]
    fn resolution_error_display() {
        let e = ResolutionError::NoMatch {
            query: "NotAFamily".to_string(),
        };
        assert!(format!("{e}").contains("NotAFamily"));
    }
}
