//! Paged iteration over the occurrence search endpoint

use std::time::Duration;

use occline_core::{HttpError, backoff_duration, get_json};

use crate::raw::SearchPage;

/// Source of search pages. The HTTP implementation is [`HttpPageSource`];
/// tests drive the pager with an in-memory source.
pub trait PageSource {
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<SearchPage, HttpError>;
}

/// `PageSource` backed by `{base}/occurrence/search`
pub struct HttpPageSource {
    url: String,
    params: Vec<(&'static str, String)>,
}

impl HttpPageSource {
    /// `params` carries the taxon key and the policy's server-side filters.
    pub fn new(base_url: &str, params: Vec<(&'static str, String)>) -> Self {
        Self {
            url: format!("{base_url}/occurrence/search"),
            params,
        }
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<SearchPage, HttpError> {
        let mut query = self.params.clone();
        query.push(("limit", limit.to_string()));
        query.push(("offset", offset.to_string()));
        get_json(&self.url, &query)
    }
}

/// Drives a [`PageSource`] until exhaustion.
///
/// Stops on an empty page or `endOfRecords`; the cap on *kept* records is
/// the orchestrator's concern, since it only counts records that survive
/// filtering. Pacing: a fixed delay before every page after the first.
/// A transient error is retried once with backoff, then surfaces as fatal.
pub struct Pager<S> {
    source: S,
    page_size: u64,
    page_delay: Duration,
    offset: u64,
    total_available: Option<u64>,
    pages_fetched: usize,
    done: bool,
}

impl<S: PageSource> Pager<S> {
    pub fn new(source: S, page_size: u64, page_delay: Duration) -> Self {
        Self {
            source,
            page_size,
            page_delay,
            offset: 0,
            total_available: None,
            pages_fetched: 0,
            done: false,
        }
    }

    /// Total match count reported by the server, known after the first page.
    pub fn total_available(&self) -> Option<u64> {
        self.total_available
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next page, or `None` once the result set is exhausted.
    pub fn next_page(&mut self) -> Result<Option<SearchPage>, HttpError> {
        if self.done {
            return Ok(None);
        }

        // Rate limiting: pace requests between pages
        if self.pages_fetched > 0 && !self.page_delay.is_zero() {
            std::thread::sleep(self.page_delay);
        }

        let page = match self.source.fetch(self.offset, self.page_size) {
            Ok(p) => p,
            Err(e) if e.is_retryable() => {
                let delay = backoff_duration(1);
                log::warn!(
                    "page at offset {} failed ({e}), retrying once in {delay:?}",
                    self.offset
                );
                std::thread::sleep(delay);
                self.source.fetch(self.offset, self.page_size)?
            }
            Err(e) => return Err(e),
        };

        self.pages_fetched += 1;
        self.total_available = Some(page.count);
        self.offset += self.page_size;

        if page.results.is_empty() {
            self.done = true;
            return Ok(None);
        }
        if page.end_of_records {
            self.done = true;
        }
        Ok(Some(page))
    }
}
