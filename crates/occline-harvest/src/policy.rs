//! Declarative data-quality policy shared by every pipeline stage
//!
//! The server-side-filterable subset goes out as search parameters; the
//! issue deny-list is re-checked client-side on every record, since GBIF
//! does not reliably support negative issue filtering.

/// Quality filter contract for one harvest run.
#[derive(Debug, Clone)]
pub struct QualityPolicy {
    pub has_coordinate: bool,
    pub has_geospatial_issue: bool,
    /// Accepted coordinate uncertainty, meters (inclusive bounds)
    pub min_coordinate_uncertainty_m: u32,
    pub max_coordinate_uncertainty_m: u32,
    /// Acceptable basis-of-record values
    pub basis_of_record: Vec<&'static str>,
    /// Acceptable license identifiers
    pub licenses: Vec<&'static str>,
    /// Issue flags that exclude a record outright
    pub denied_issues: Vec<&'static str>,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            has_coordinate: true,
            has_geospatial_issue: false,
            min_coordinate_uncertainty_m: 0,
            max_coordinate_uncertainty_m: 10_000,
            basis_of_record: vec![
                "HUMAN_OBSERVATION",
                "PRESERVED_SPECIMEN",
                "MACHINE_OBSERVATION",
                "MATERIAL_SAMPLE",
            ],
            licenses: vec!["CC0_1_0", "CC_BY_4_0", "CC_BY_NC_4_0"],
            denied_issues: vec![
                "ZERO_COORDINATE",
                "COORDINATE_INVALID",
                "COORDINATE_OUT_OF_RANGE",
                "COUNTRY_COORDINATE_MISMATCH",
                "RECORDED_DATE_INVALID",
                "TAXON_MATCH_HIGHERRANK",
            ],
        }
    }
}

impl QualityPolicy {
    /// Render the server-side-filterable parameters for the occurrence
    /// search, including the taxon key. Allow-lists become repeated
    /// query pairs.
    pub fn search_params(&self, taxon_key: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("taxonKey", taxon_key.to_string()),
            ("hasCoordinate", self.has_coordinate.to_string()),
            ("hasGeospatialIssue", self.has_geospatial_issue.to_string()),
            (
                "coordinateUncertaintyInMeters",
                format!(
                    "{},{}",
                    self.min_coordinate_uncertainty_m, self.max_coordinate_uncertainty_m
                ),
            ),
        ];
        for basis in &self.basis_of_record {
            params.push(("basisOfRecord", basis.to_string()));
        }
        for license in &self.licenses {
            params.push(("license", license.to_string()));
        }
        params
    }

    /// Client-side re-check: first denied issue flag carried by the
    /// record, if any.
    pub fn denied_issue<'a>(&self, issues: &'a [String]) -> Option<&'a str> {
        issues
            .iter()
            .map(String::as_str)
            .find(|i| self.denied_issues.contains(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_coordinate_is_denied() {
        let policy = QualityPolicy::default();
        assert_eq!(
            policy.denied_issue(&flags(&["ZERO_COORDINATE"])),
            Some("ZERO_COORDINATE")
        );
    }

    #[test]
    fn benign_issue_passes() {
        let policy = QualityPolicy::default();
        assert!(policy
            .denied_issue(&flags(&["GEODETIC_DATUM_ASSUMED_WGS84"]))
            .is_none());
    }

    #[test]
    fn denied_among_benign_is_found() {
        let policy = QualityPolicy::default();
        assert_eq!(
            policy.denied_issue(&flags(&[
                "GEODETIC_DATUM_ASSUMED_WGS84",
                "COUNTRY_COORDINATE_MISMATCH",
            ])),
            Some("COUNTRY_COORDINATE_MISMATCH")
        );
    }

    #[test]
    fn no_issues_passes() {
        let policy = QualityPolicy::default();
        assert!(policy.denied_issue(&[]).is_none());
    }

    #[test]
    fn search_params_include_required_flags() {
        let policy = QualityPolicy::default();
        let params = policy.search_params(42);
        assert!(params.contains(&("taxonKey", "42".to_string())));
        assert!(params.contains(&("hasCoordinate", "true".to_string())));
        assert!(params.contains(&("hasGeospatialIssue", "false".to_string())));
        assert!(params.contains(&("coordinateUncertaintyInMeters", "0,10000".to_string())));
    }

    #[test]
    fn search_params_repeat_allow_lists() {
        let policy = QualityPolicy::default();
        let params = policy.search_params(1);
        let basis: Vec<_> = params.iter().filter(|(k, _)| *k == "basisOfRecord").collect();
        let licenses: Vec<_> = params.iter().filter(|(k, _)| *k == "license").collect();
        assert_eq!(basis.len(), policy.basis_of_record.len());
        assert_eq!(licenses.len(), policy.licenses.len());
    }
}
