//! Sampled reachability checks for embedded media links

use std::time::Duration;

use rand::seq::index::sample;
use rayon::prelude::*;

use occline_core::head_ok;

use crate::record::OccurrenceRecord;

/// Outcome of the media-sampling phase; folded into the quality report,
/// never persisted as a catalog.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Records drawn into the sample
    pub sampled_records: usize,
    pub checked: usize,
    pub accessible: usize,
    pub broken: usize,
    pub broken_urls: Vec<String>,
}

impl ValidationResult {
    pub fn success_rate(&self) -> f64 {
        if self.checked == 0 {
            return 0.0;
        }
        self.accessible as f64 / self.checked as f64 * 100.0
    }
}

/// Samples records with media and HEAD-checks their first few URLs.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    pub sample_size: usize,
    /// URLs checked per sampled record, to bound cost
    pub per_record_cap: usize,
    pub timeout: Duration,
}

impl Default for MediaValidator {
    fn default() -> Self {
        Self {
            sample_size: 100,
            per_record_cap: 3,
            timeout: Duration::from_secs(10),
        }
    }
}

impl MediaValidator {
    /// Validate against the live network. Timeouts count as broken.
    pub fn validate(&self, records: &[OccurrenceRecord]) -> ValidationResult {
        let timeout = self.timeout;
        self.validate_with(records, |url| head_ok(url, timeout))
    }

    /// Validation with an injectable checker (tests run without network).
    /// Checks fan out on the rayon pool; accumulation stays serialized.
    pub fn validate_with(
        &self,
        records: &[OccurrenceRecord],
        checker: impl Fn(&str) -> bool + Sync,
    ) -> ValidationResult {
        let with_media: Vec<&OccurrenceRecord> = records
            .iter()
            .filter(|r| !r.media_urls.is_empty())
            .collect();
        let n = self.sample_size.min(with_media.len());
        if n == 0 {
            return ValidationResult::default();
        }

        let urls: Vec<&str> = sample(&mut rand::thread_rng(), with_media.len(), n)
            .iter()
            .flat_map(|i| {
                with_media[i]
                    .media_urls
                    .iter()
                    .take(self.per_record_cap)
                    .map(String::as_str)
            })
            .collect();

        let outcomes: Vec<(&str, bool)> = urls
            .par_iter()
            .map(|url| (*url, checker(url)))
            .collect();

        let mut result = ValidationResult {
            sampled_records: n,
            ..Default::default()
        };
        for (url, ok) in outcomes {
            result.checked += 1;
            if ok {
                result.accessible += 1;
            } else {
                result.broken += 1;
                result.broken_urls.push(url.to_string());
            }
        }
        result
    }
}
