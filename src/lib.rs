//! `trawler` is a library for crawling webs of linked documents with a
//! fixed number of threads.
//!
//! It does no I/O of its own: you plug in a [`Downloader`] that fetches a
//! [`Document`] and the document lists its links. `trawler` schedules the
//! downloads, follows the links up to a maximum depth, never fetches a URL
//! twice and keeps every host below a configurable number of simultaneous
//! downloads.
//!
//! "Hello world" example:
//! ```
//! use std::collections::HashMap;
//! use trawler::{Document, Downloader, ErrorKind, Result};
//!
//! struct Page(Vec<String>);
//!
//! impl Document for Page {
//!     fn extract_links(&self) -> Result<Vec<String>> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! struct Site(HashMap<&'static str, Vec<String>>);
//!
//! impl Downloader for Site {
//!     type Document = Page;
//!
//!     fn fetch(&self, url: &str) -> Result<Page> {
//!         self.0
//!             .get(url)
//!             .map(|links| Page(links.clone()))
//!             .ok_or_else(|| ErrorKind::download(format!("{url}: 404")))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let site = Site(HashMap::from([
//!     ("https://a.com/", vec!["https://a.com/about".to_string()]),
//!     ("https://a.com/about", vec!["https://a.com/missing".to_string()]),
//! ]));
//! let result = trawler::crawl(site, "https://a.com/", 3, 4, 2, 1)?;
//! assert_eq!(result.sorted_downloaded(), vec!["https://a.com/", "https://a.com/about"]);
//! assert!(result.errors.contains_key("https://a.com/missing"));
//! # Ok(())
//! # }
//! ```
//!
//! For more specific use-cases you can build a crawler yourself, using the
//! [`CrawlerBuilder`], which also accepts a [`CrawlerConfig`] loaded from a
//! TOML file. A [`WebCrawler`] keeps its worker threads between crawls.

mod collaborators;
mod config;
mod crawler;
mod filter;
mod gate;
mod pool;
mod types;
mod utils;
mod waiter;

pub mod parallel;
#[cfg(test)]
pub(crate) mod test_utils;

pub use collaborators::{Document, Downloader, HostParser, UrlHostParser};
pub use config::CrawlerConfig;
pub use crawler::{
    CrawlerBuilder, DEFAULT_DOWNLOADERS, DEFAULT_EXTRACTORS, ResultAccumulator, WebCrawler,
};
pub use filter::Filter;
pub use gate::{
    Admission, DEFAULT_PER_HOST, Host, HostConfig, HostConfigs, HostGate, HostKey, HostPermit,
    HostStats, HostStatsMap,
};
pub use pool::{MapError, ShutdownMode, WorkerPool};
pub use types::*;
pub use waiter::{WaitGroup, WaitGuard};

/// Crawl everything reachable from `root` within `depth` levels, using
/// `downloaders` download threads, `extractors` extraction threads and at
/// most `per_host` simultaneous downloads per host.
///
/// The threads are started for this call and stopped before it returns.
/// Use a [`WebCrawler`] to keep them around.
///
/// # Errors
///
/// Fails if any of the sizes is zero or the threads cannot be started.
/// Failures of individual URLs are part of the returned [`CrawlResult`].
pub fn crawl<D: Downloader>(
    downloader: D,
    root: &str,
    depth: usize,
    downloaders: usize,
    extractors: usize,
    per_host: usize,
) -> Result<CrawlResult> {
    let crawler = WebCrawler::new(downloader, downloaders, extractors, per_host)?;
    let result = crawler.download(root, depth);
    crawler.close()?;
    Ok(result)
}
