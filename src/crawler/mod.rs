//! Depth-bounded crawler on top of two worker pools.
//!
//! A crawl starts at a root URL and follows links, in no particular order, up to
//! a maximum depth. Downloads run on one pool, link extraction on another,
//! and every download first passes the [`HostGate`] so that no host sees
//! more than its configured number of simultaneous fetches.
//!
//! ```
//! use trawler::{CrawlerBuilder, Document, Downloader, Result};
//!
//! struct Leaf;
//! impl Document for Leaf {
//!     fn extract_links(&self) -> Result<Vec<String>> {
//!         Ok(vec![])
//!     }
//! }
//!
//! struct Offline;
//! impl Downloader for Offline {
//!     type Document = Leaf;
//!     fn fetch(&self, _url: &str) -> Result<Leaf> {
//!         Ok(Leaf)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let crawler = CrawlerBuilder::builder().per_host(2_usize).build().crawler(Offline)?;
//! let result = crawler.download("https://example.com", 3);
//! assert_eq!(result.downloaded, vec!["https://example.com".to_string()]);
//! # Ok(())
//! # }
//! ```
mod accumulator;
mod session;
mod ticket;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use dashmap::DashSet;
use typed_builder::TypedBuilder;

pub use accumulator::ResultAccumulator;
use session::{Predicate, Session};

use crate::{
    CrawlResult, CrawlerConfig, DEFAULT_PER_HOST, Downloader, ErrorKind, Filter, HostConfigs,
    HostGate, HostParser, HostStatsMap, Result, ShutdownMode, UrlHostParser, WaitGroup,
    WorkerPool,
};

/// Default number of download workers
pub const DEFAULT_DOWNLOADERS: usize = 8;
/// Default number of link extraction workers
pub const DEFAULT_EXTRACTORS: usize = 8;

/// Builder for [`WebCrawler`].
///
/// See module-level documentation for usage example.
#[derive(TypedBuilder, Clone)]
#[builder(field_defaults(default, setter(into)))]
#[builder(builder_method(doc = "
Create a builder for building `CrawlerBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `CrawlerBuilder`.
"))]
pub struct CrawlerBuilder {
    /// Number of threads fetching documents
    #[builder(default = DEFAULT_DOWNLOADERS)]
    downloaders: usize,
    /// Number of threads extracting links from fetched documents
    #[builder(default = DEFAULT_EXTRACTORS)]
    extractors: usize,
    /// Maximum number of simultaneous downloads from one host.
    ///
    /// Independent of `downloaders`: with more workers than the limit, the
    /// surplus tasks for a busy host wait in that host's queue and the
    /// workers serve other hosts.
    #[builder(default = DEFAULT_PER_HOST)]
    per_host: usize,
    /// Per-host overrides of `per_host`
    hosts: HostConfigs,
    /// Filter applied to every discovered URL, including the root
    filter: Option<Filter>,
    /// Only follow links on the root URL's host
    same_host: bool,
    /// Deadline for a single [`WebCrawler::download`] call.
    ///
    /// When it passes, tasks that have not started yet are discarded and
    /// reported as [`ErrorKind::Cancelled`]. Fetches that are already
    /// running are waited for.
    timeout: Option<Duration>,
    /// How to derive the host of a URL. Defaults to [`UrlHostParser`].
    host_parser: Option<Arc<dyn HostParser>>,
}

impl Default for CrawlerBuilder {
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for CrawlerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlerBuilder")
            .field("downloaders", &self.downloaders)
            .field("extractors", &self.extractors)
            .field("per_host", &self.per_host)
            .field("hosts", &self.hosts)
            .field("filter", &self.filter)
            .field("same_host", &self.same_host)
            .field("timeout", &self.timeout)
            .field("custom_host_parser", &self.host_parser.is_some())
            .finish()
    }
}

impl CrawlerBuilder {
    /// Take every setting from `config`.
    ///
    /// # Errors
    ///
    /// Fails if an include or exclude pattern is not a valid regex.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        let filter = if config.include.is_empty() && config.exclude.is_empty() {
            None
        } else {
            Some(Filter::from_patterns(&config.include, &config.exclude)?)
        };
        Ok(Self::builder()
            .downloaders(config.downloaders)
            .extractors(config.extractors)
            .per_host(config.per_host)
            .hosts(config.hosts.clone())
            .filter(filter)
            .same_host(config.same_host)
            .timeout(config.timeout)
            .build())
    }

    /// Instantiates a [`WebCrawler`] and starts its worker threads.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - Any of `downloaders`, `extractors` or `per_host` is zero.
    /// - A per-host override is zero.
    /// - A worker thread cannot be spawned.
    pub fn crawler<D: Downloader>(self, downloader: D) -> Result<WebCrawler<D>> {
        let Self {
            downloaders,
            extractors,
            per_host,
            hosts,
            filter,
            same_host,
            timeout,
            host_parser,
        } = self;

        let gate = HostGate::new(per_host, hosts)?;
        let downloaders = WorkerPool::new("downloader", downloaders)?;
        let extractors = match WorkerPool::new("extractor", extractors) {
            Ok(pool) => pool,
            Err(e) => {
                // Don't leave the download workers behind
                let _ = downloaders.close(ShutdownMode::Abort);
                return Err(e);
            }
        };

        Ok(WebCrawler {
            downloader: Arc::new(downloader),
            host_parser: host_parser.unwrap_or_else(|| Arc::new(UrlHostParser) as Arc<dyn HostParser>),
            gate: Arc::new(gate),
            downloaders,
            extractors,
            filter,
            same_host,
            timeout,
        })
    }
}

/// Crawls a web of documents with a fixed set of worker threads.
///
/// The worker pools live as long as the crawler, so any number of
/// [`WebCrawler::download`] calls can share them, also concurrently. The
/// host gate is shared as well: per-host limits hold across calls.
pub struct WebCrawler<D: Downloader> {
    downloader: Arc<D>,
    host_parser: Arc<dyn HostParser>,
    gate: Arc<HostGate>,
    downloaders: WorkerPool,
    extractors: WorkerPool,
    filter: Option<Filter>,
    same_host: bool,
    timeout: Option<Duration>,
}

impl<D: Downloader> WebCrawler<D> {
    /// Create a crawler with `downloaders` download threads, `extractors`
    /// extraction threads and at most `per_host` simultaneous downloads
    /// per host.
    ///
    /// # Errors
    ///
    /// See [`CrawlerBuilder::crawler`].
    pub fn new(downloader: D, downloaders: usize, extractors: usize, per_host: usize) -> Result<Self> {
        CrawlerBuilder::builder()
            .downloaders(downloaders)
            .extractors(extractors)
            .per_host(per_host)
            .build()
            .crawler(downloader)
    }

    /// Crawl everything reachable from `url` within `depth` levels.
    ///
    /// `depth` 1 downloads `url` only, `depth` 0 does nothing. Blocks until
    /// every reached URL was downloaded or failed. Per-URL failures never
    /// stop the crawl; they end up in [`CrawlResult::errors`].
    #[must_use]
    pub fn download(&self, url: &str, depth: usize) -> CrawlResult {
        self.download_filtered(url, depth, |_| true)
    }

    /// Like [`WebCrawler::download`], but only URLs for which `predicate`
    /// returns `true` are crawled. The predicate is checked before a URL
    /// is marked as visited.
    #[must_use]
    pub fn download_filtered<P>(&self, url: &str, depth: usize, predicate: P) -> CrawlResult
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let mut filters: Vec<Filter> = self.filter.iter().cloned().collect();
        if self.same_host {
            match Filter::same_host(url) {
                Ok(filter) => filters.push(filter),
                // The root is reported when its host fails to parse
                Err(e) => log::debug!("Cannot restrict crawl to the host of {url}: {e}"),
            }
        }
        let predicate: Predicate = if filters.is_empty() {
            Box::new(predicate)
        } else {
            Box::new(move |candidate: &str| {
                filters.iter().all(|f| f.is_allowed(candidate)) && predicate(candidate)
            })
        };
        self.run(url, depth, predicate)
    }

    fn run(&self, url: &str, depth: usize, predicate: Predicate) -> CrawlResult {
        log::info!("Crawling {url} up to depth {depth}");
        let start = Instant::now();

        let session = Arc::new(Session {
            downloader: Arc::clone(&self.downloader),
            host_parser: Arc::clone(&self.host_parser),
            gate: Arc::clone(&self.gate),
            downloaders: self.downloaders.clone(),
            extractors: self.extractors.clone(),
            predicate,
            visited: DashSet::new(),
            results: Arc::new(ResultAccumulator::default()),
            cancelled: AtomicBool::new(false),
        });

        let (waiter, root) = WaitGroup::new();
        session.crawl(url.to_string(), depth, &root);
        // Only now may the count reach zero: the root task is registered
        drop(root);

        match self.timeout {
            Some(timeout) if !waiter.wait_timeout(timeout) => {
                log::warn!(
                    "Crawl of {url} exceeded {timeout:?}, cancelling {} outstanding task(s)",
                    waiter.outstanding()
                );
                session.cancel();
                waiter.wait();
            }
            Some(_) => {}
            None => waiter.wait(),
        }

        let result = session.results.finalize();
        log::info!(
            "Crawled {url} in {:?}: {} downloaded, {} failed",
            start.elapsed(),
            result.downloaded.len(),
            result.errors.len()
        );
        result
    }

    /// Statistics for every host contacted so far
    #[must_use]
    pub fn host_stats(&self) -> HostStatsMap {
        self.gate.all_host_stats()
    }

    /// Stop both pools after the work already queued has run.
    ///
    /// Any later [`WebCrawler::download`] reports its root as
    /// [`ErrorKind::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Join`] listing every worker of either pool
    /// that panicked.
    pub fn close(&self) -> Result<()> {
        self.shutdown(ShutdownMode::Graceful)
    }

    /// Stop both pools and discard all work that has not started.
    ///
    /// Crawls that are in progress on other threads return promptly; the
    /// URLs whose tasks were discarded are reported as
    /// [`ErrorKind::Cancelled`].
    ///
    /// # Errors
    ///
    /// See [`WebCrawler::close`].
    pub fn abort(&self) -> Result<()> {
        self.shutdown(ShutdownMode::Abort)
    }

    fn shutdown(&self, mode: ShutdownMode) -> Result<()> {
        // Both pools are closed even if the first reports failures
        let failures: Vec<String> = [
            self.downloaders.close(mode),
            self.extractors.close(mode),
        ]
        .into_iter()
        .filter_map(std::result::Result::err)
        .flat_map(|err| match err {
            ErrorKind::Join(failures) => failures,
            other => vec![other.to_string()],
        })
        .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ErrorKind::Join(failures))
        }
    }
}

impl<D: Downloader> std::fmt::Debug for WebCrawler<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebCrawler")
            .field("downloaders", &self.downloaders)
            .field("extractors", &self.extractors)
            .field("gate", &self.gate)
            .field("filter", &self.filter)
            .field("same_host", &self.same_host)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<D: Downloader> Drop for WebCrawler<D> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::thread;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::test_utils::GraphDownloader;
    use crate::{Document, HostConfig, HostKey};

    /// `root` linking to `count` leaf pages on its own host
    fn fan(root: &str, count: usize, latency: Duration) -> Arc<GraphDownloader> {
        let links: Vec<String> = (0..count).map(|i| format!("{root}{i}")).collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let graph = links
            .iter()
            .fold(GraphDownloader::new(), |graph, link| graph.page(link, &[]));
        Arc::new(graph.page(root, &link_refs).latency(latency))
    }

    fn crawler(graph: GraphDownloader, per_host: usize) -> WebCrawler<Arc<GraphDownloader>> {
        let _ = env_logger::builder().is_test(true).try_init();
        WebCrawler::new(Arc::new(graph), 4, 4, per_host).unwrap()
    }

    #[test]
    fn test_zero_sizes_rejected() {
        for (downloaders, extractors, per_host) in [(0, 1, 1), (1, 0, 1), (1, 1, 0)] {
            assert!(matches!(
                WebCrawler::new(GraphDownloader::new(), downloaders, extractors, per_host),
                Err(ErrorKind::InvalidPoolSize(_))
            ));
        }
    }

    #[rstest]
    #[case(0, vec![])]
    #[case(1, vec!["https://a.com/"])]
    #[case(2, vec!["https://a.com/", "https://a.com/b", "https://b.com/"])]
    #[case(3, vec!["https://a.com/", "https://a.com/b", "https://a.com/c", "https://b.com/"])]
    fn test_depth_bounds_crawl(#[case] depth: usize, #[case] expected: Vec<&str>) {
        let graph = GraphDownloader::new()
            .page("https://a.com/", &["https://a.com/b", "https://b.com/"])
            .page("https://a.com/b", &["https://a.com/c"])
            .page("https://b.com/", &[])
            .page("https://a.com/c", &["https://a.com/d"])
            .page("https://a.com/d", &[]);
        let crawler = crawler(graph, 2);

        let result = crawler.download("https://a.com/", depth);
        assert_eq!(result.sorted_downloaded(), expected);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_cycle_is_fetched_once() {
        let graph = Arc::new(
            GraphDownloader::new()
                .page("https://a.com/", &["https://a.com/x", "https://a.com/"])
                .page("https://a.com/x", &["https://a.com/", "https://a.com/x"]),
        );
        let crawler = WebCrawler::new(Arc::clone(&graph), 3, 3, 3).unwrap();

        let result = crawler.download("https://a.com/", 10);
        assert_eq!(result.downloaded.len(), 2);
        assert_eq!(graph.fetch_count("https://a.com/"), 1);
        assert_eq!(graph.total_fetches(), 2);
    }

    #[test]
    fn test_fetch_errors_are_isolated() {
        let graph = GraphDownloader::new()
            .page("https://a.com/", &["https://a.com/gone", "https://a.com/ok"])
            .failing("https://a.com/gone")
            .page("https://a.com/ok", &[]);
        let crawler = crawler(graph, 2);

        let result = crawler.download("https://a.com/", 2);
        assert_eq!(
            result.sorted_downloaded(),
            vec!["https://a.com/", "https://a.com/ok"]
        );
        assert!(matches!(
            result.errors["https://a.com/gone"],
            ErrorKind::Download(_)
        ));
    }

    #[test]
    fn test_malformed_link_is_an_error() {
        let graph = GraphDownloader::new().page("https://a.com/", &["not a url", "mailto:x@a.com"]);
        let crawler = crawler(graph, 1);

        let result = crawler.download("https://a.com/", 2);
        assert_eq!(result.downloaded, vec!["https://a.com/".to_string()]);
        assert!(matches!(result.errors["not a url"], ErrorKind::InvalidUrl(..)));
        assert!(matches!(
            result.errors["mailto:x@a.com"],
            ErrorKind::InvalidUrlHost(_)
        ));
    }

    #[test]
    fn test_extraction_error_keeps_download() {
        let graph = GraphDownloader::new()
            .page("https://a.com/", &["https://a.com/b"])
            .broken("https://a.com/");
        let crawler = crawler(graph, 1);

        let result = crawler.download("https://a.com/", 3);
        assert_eq!(result.downloaded, vec!["https://a.com/".to_string()]);
        assert!(result.errors.is_empty());
        assert!(matches!(
            result.link_errors["https://a.com/"],
            ErrorKind::Extract(_)
        ));
    }

    #[test]
    fn test_panicking_document_is_reported() {
        struct Explosive;
        impl Document for Explosive {
            fn extract_links(&self) -> Result<Vec<String>> {
                panic!("malformed document");
            }
        }
        struct Fragile;
        impl Downloader for Fragile {
            type Document = Explosive;
            fn fetch(&self, _url: &str) -> Result<Explosive> {
                Ok(Explosive)
            }
        }

        let crawler = WebCrawler::new(Fragile, 1, 1, 1).unwrap();
        let result = crawler.download("https://a.com/", 2);
        assert_eq!(result.downloaded, vec!["https://a.com/".to_string()]);
        assert!(matches!(
            result.link_errors["https://a.com/"],
            ErrorKind::TaskPanicked(_)
        ));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn test_per_host_limit_holds(#[case] per_host: usize) {
        let graph = fan("https://a.com/", 12, Duration::from_millis(5));
        let crawler = WebCrawler::new(Arc::clone(&graph), 8, 2, per_host).unwrap();

        let result = crawler.download("https://a.com/", 2);
        assert_eq!(result.downloaded.len(), 13);
        assert!(graph.max_active("a.com") <= per_host);

        let stats = crawler.host_stats();
        let stats = stats.get("a.com").unwrap();
        assert_eq!(stats.admitted, 13);
        assert!(stats.max_active <= per_host);
    }

    #[test]
    fn test_host_override() {
        let graph = fan("https://slow.com/", 6, Duration::from_millis(5));
        let mut hosts = HashMap::new();
        hosts.insert(HostKey::from("slow.com"), HostConfig { concurrency: Some(1) });
        let crawler = CrawlerBuilder::builder()
            .per_host(4_usize)
            .hosts(hosts)
            .build()
            .crawler(Arc::clone(&graph))
            .unwrap();

        let result = crawler.download("https://slow.com/", 2);
        assert_eq!(result.downloaded.len(), 7);
        assert_eq!(graph.max_active("slow.com"), 1);
    }

    #[test]
    fn test_predicate_applies_before_visit() {
        let graph = Arc::new(
            GraphDownloader::new()
                .page("https://a.com/", &["https://a.com/private", "https://a.com/public"])
                .page("https://a.com/public", &[]),
        );
        let crawler = WebCrawler::new(Arc::clone(&graph), 2, 2, 2).unwrap();

        let result = crawler.download_filtered("https://a.com/", 2, |url| !url.contains("private"));
        assert_eq!(
            result.sorted_downloaded(),
            vec!["https://a.com/", "https://a.com/public"]
        );
        assert_eq!(graph.fetch_count("https://a.com/private"), 0);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_same_host() {
        let graph = GraphDownloader::new()
            .page("https://a.com/", &["https://a.com/b", "https://b.com/"])
            .page("https://a.com/b", &[]);
        let crawler = CrawlerBuilder::builder()
            .same_host(true)
            .build()
            .crawler(graph)
            .unwrap();

        let result = crawler.download("https://a.com/", 3);
        assert_eq!(
            result.sorted_downloaded(),
            vec!["https://a.com/", "https://a.com/b"]
        );
    }

    #[test]
    fn test_custom_host_parser() {
        let graph = GraphDownloader::new().page("https://a.com/", &[]);
        let parser: Arc<dyn HostParser> = Arc::new(|url: &str| -> Result<HostKey> {
            Err(ErrorKind::InvalidUrlHost(url.to_string()))
        });
        let crawler = CrawlerBuilder::builder()
            .host_parser(parser)
            .build()
            .crawler(graph)
            .unwrap();

        let result = crawler.download("https://a.com/", 1);
        assert!(result.downloaded.is_empty());
        assert!(matches!(
            result.errors["https://a.com/"],
            ErrorKind::InvalidUrlHost(_)
        ));
    }

    #[test]
    fn test_timeout_cancels_pending_work() {
        let graph = fan("https://a.com/", 20, Duration::from_millis(30));
        let crawler = CrawlerBuilder::builder()
            .per_host(1_usize)
            .timeout(Duration::from_millis(100))
            .build()
            .crawler(Arc::clone(&graph))
            .unwrap();

        let result = crawler.download("https://a.com/", 2);
        assert!(result.cancelled() > 0);
        assert_eq!(result.total(), 21);
        assert!(graph.total_fetches() < 21);
        assert!(result.downloaded.iter().all(|url| !result.errors.contains_key(url)));
    }

    #[test]
    fn test_unbounded_timeout() {
        let graph = GraphDownloader::new().page("https://a.com/", &[]);
        let crawler = CrawlerBuilder::builder()
            .timeout(Duration::MAX)
            .build()
            .crawler(graph)
            .unwrap();

        let result = crawler.download("https://a.com/", 1);
        assert_eq!(result.downloaded, vec!["https://a.com/".to_string()]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_download_after_close_is_cancelled() {
        let graph = GraphDownloader::new().page("https://a.com/", &[]);
        let crawler = crawler(graph, 1);
        crawler.close().unwrap();

        let result = crawler.download("https://a.com/", 1);
        assert!(result.downloaded.is_empty());
        assert!(matches!(result.errors["https://a.com/"], ErrorKind::PoolClosed | ErrorKind::Cancelled));
    }

    #[test]
    fn test_abort_drains_running_crawl() {
        let graph = fan("https://a.com/", 50, Duration::from_millis(10));
        let crawler = Arc::new(WebCrawler::new(Arc::clone(&graph), 2, 2, 1).unwrap());

        let handle = {
            let crawler = Arc::clone(&crawler);
            thread::spawn(move || crawler.download("https://a.com/", 2))
        };
        while graph.total_fetches() < 3 {
            thread::yield_now();
        }
        crawler.abort().unwrap();

        let result = handle.join().unwrap();
        assert_eq!(result.total(), 51);
        assert!(result.cancelled() > 0);
    }

    #[test]
    fn test_abort_reports_every_failed_worker() {
        struct FailingCleanup(&'static str);
        impl Drop for FailingCleanup {
            fn drop(&mut self) {
                panic!("{} cleanup failed", self.0);
            }
        }

        /// Occupy both workers of `pool`, then queue two tasks whose
        /// destructors panic
        fn saturate(pool: &WorkerPool, label: &'static str) -> crossbeam_channel::Sender<()> {
            let (started_tx, started_rx) = crossbeam_channel::unbounded();
            let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
            for _ in 0..2 {
                let started_tx = started_tx.clone();
                let release_rx = release_rx.clone();
                pool.submit(move || {
                    started_tx.send(()).unwrap();
                    let _ = release_rx.recv();
                })
                .unwrap();
            }
            started_rx.recv().unwrap();
            started_rx.recv().unwrap();
            for _ in 0..2 {
                let cleanup = FailingCleanup(label);
                pool.submit(move || {
                    let _cleanup = cleanup;
                })
                .unwrap();
            }
            release_tx
        }

        let crawler = Arc::new(WebCrawler::new(GraphDownloader::new(), 2, 2, 1).unwrap());
        let release_downloads = saturate(&crawler.downloaders, "download");
        let release_extractions = saturate(&crawler.extractors, "extraction");

        let aborter = {
            let crawler = Arc::clone(&crawler);
            thread::spawn(move || crawler.abort())
        };
        for (pool, release) in [
            (&crawler.downloaders, release_downloads),
            (&crawler.extractors, release_extractions),
        ] {
            while !pool.is_closed() {
                thread::yield_now();
            }
            release.send(()).unwrap();
            release.send(()).unwrap();
        }

        let Err(ErrorKind::Join(failures)) = aborter.join().unwrap() else {
            panic!("expected every worker to fail");
        };
        assert_eq!(failures.len(), 4, "{failures:?}");
        let count = |prefix: &str, message: &str| {
            failures
                .iter()
                .filter(|f| f.starts_with(prefix) && f.contains(message))
                .count()
        };
        assert_eq!(count("downloader-", "download cleanup failed"), 2);
        assert_eq!(count("extractor-", "extraction cleanup failed"), 2);
    }

    #[test]
    fn test_concurrent_downloads_share_pools() {
        let graph = Arc::new(
            GraphDownloader::new()
                .page("https://a.com/", &["https://a.com/1"])
                .page("https://a.com/1", &[])
                .page("https://b.com/", &["https://b.com/1"])
                .page("https://b.com/1", &[]),
        );
        let crawler = Arc::new(WebCrawler::new(Arc::clone(&graph), 2, 2, 1).unwrap());

        let handles: Vec<_> = ["https://a.com/", "https://b.com/"]
            .into_iter()
            .map(|root| {
                let crawler = Arc::clone(&crawler);
                thread::spawn(move || crawler.download(root, 2))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().downloaded.len(), 2);
        }
    }

    #[test]
    fn test_builder_from_config() {
        let config = CrawlerConfig::from_toml(
            r#"
            downloaders = 2
            extractors = 1
            per_host = 1
            exclude = ["/skip"]
            "#,
        )
        .unwrap();
        let builder = CrawlerBuilder::from_config(&config).unwrap();
        let graph = GraphDownloader::new()
            .page("https://a.com/", &["https://a.com/skip", "https://a.com/keep"])
            .page("https://a.com/keep", &[]);

        let result = builder.crawler(graph).unwrap().download("https://a.com/", 2);
        assert_eq!(
            result.sorted_downloaded(),
            vec!["https://a.com/", "https://a.com/keep"]
        );
    }
}
