use dashmap::{DashMap, DashSet};

use crate::{CrawlResult, ErrorKind};

/// Thread-safe collection of crawl outcomes, written by many workers and
/// read once at the end.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    downloaded: DashSet<String>,
    errors: DashMap<String, ErrorKind>,
    link_errors: DashMap<String, ErrorKind>,
}

impl ResultAccumulator {
    /// Record a successful download
    pub fn add_downloaded(&self, url: &str) {
        self.downloaded.insert(url.to_string());
    }

    /// Record why `url` could not be downloaded. The first error for a URL
    /// wins.
    pub fn add_error(&self, url: &str, err: ErrorKind) {
        log::warn!("{url}: {err}");
        self.errors.entry(url.to_string()).or_insert(err);
    }

    /// Record why the links of a downloaded `url` could not be extracted
    pub fn add_link_error(&self, url: &str, err: ErrorKind) {
        log::warn!("{url}: {err}");
        self.link_errors.entry(url.to_string()).or_insert(err);
    }

    /// Move everything recorded so far into a [`CrawlResult`], leaving the
    /// accumulator empty. URLs with an error are removed from the
    /// downloaded set.
    ///
    /// Meant to be called once no writer is left.
    #[must_use]
    pub fn finalize(&self) -> CrawlResult {
        let errors = drain(&self.errors);
        let link_errors = drain(&self.link_errors);
        let downloaded = self
            .downloaded
            .iter()
            .map(|url| url.key().clone())
            .filter(|url| !errors.contains_key(url))
            .collect();
        self.downloaded.clear();

        CrawlResult {
            downloaded,
            errors,
            link_errors,
        }
    }
}

fn drain(map: &DashMap<String, ErrorKind>) -> std::collections::HashMap<String, ErrorKind> {
    let keys: Vec<String> = map.iter().map(|entry| entry.key().clone()).collect();
    keys.into_iter().filter_map(|key| map.remove(&key)).collect()
}
