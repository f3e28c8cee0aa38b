use std::collections::HashMap;

use crate::ErrorKind;

/// Outcome of a single crawl.
///
/// `downloaded` and the keys of `errors` are disjoint. A URL whose links
/// could not be extracted was still downloaded; it shows up in `downloaded`
/// and in `link_errors`.
#[derive(Debug, Default)]
pub struct CrawlResult {
    /// URLs fetched successfully, in no particular order
    pub downloaded: Vec<String>,
    /// URLs that could not be fetched, with the reason
    pub errors: HashMap<String, ErrorKind>,
    /// Downloaded URLs whose links could not be extracted
    pub link_errors: HashMap<String, ErrorKind>,
}

impl CrawlResult {
    /// Number of URLs the crawl resolved one way or another
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.errors.len()
    }

    /// Whether every reached URL was downloaded and parsed without error
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.link_errors.is_empty()
    }

    /// Downloaded URLs in lexicographic order, handy for stable output
    #[must_use]
    pub fn sorted_downloaded(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.downloaded.iter().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    /// Number of errors caused by cancellation rather than by the URL itself
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.errors
            .values()
            .filter(|err| err.is_cancellation())
            .count()
    }
}
