//! `test-utils` is used for testing in both the unit and the integration
//! tests of `trawler`.
//! This crate does not depend on `trawler`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies.

/// Define `GraphDownloader`, an in-memory web serving a fixed link graph,
/// and its `GraphDocument`.
///
/// The downloader records how often each URL was fetched and the highest
/// number of simultaneous fetches per host. URLs that were not added
/// answer with a download error.
///
/// The importer must have `Document`, `Downloader`, `ErrorKind`, `HostKey`
/// and `Result` from `trawler` in scope.
#[macro_export]
macro_rules! graph_downloader {
    () => {
        #[derive(Debug, Clone, Default)]
        struct GraphPage {
            links: Vec<String>,
            fail_fetch: bool,
            fail_extract: bool,
        }

        /// Serves a fixed link graph from memory and records how it was crawled
        #[allow(dead_code)]
        #[derive(Debug, Default)]
        pub struct GraphDownloader {
            pages: std::collections::HashMap<String, GraphPage>,
            latency: std::time::Duration,
            always_fail: bool,
            fetches: std::sync::Mutex<std::collections::HashMap<String, usize>>,
            active: std::sync::Mutex<std::collections::HashMap<HostKey, usize>>,
            max_active: std::sync::Mutex<std::collections::HashMap<HostKey, usize>>,
            running: std::sync::atomic::AtomicUsize,
        }

        #[derive(Debug)]
        pub struct GraphDocument {
            url: String,
            links: Vec<String>,
            broken: bool,
        }

        #[allow(dead_code)]
        impl GraphDownloader {
            pub fn new() -> Self {
                Self::default()
            }

            /// A wide tree: `root` links to `fanout` leaf pages on each of `hosts`
            pub fn fan(root: &str, hosts: &[&str], fanout: usize) -> Self {
                let mut children = Vec::new();
                let mut graph = Self::new();
                for host in hosts {
                    for i in 0..fanout {
                        let url = format!("https://{host}/{i}");
                        graph = graph.page(&url, &[]);
                        children.push(url);
                    }
                }
                let children: Vec<&str> = children.iter().map(String::as_str).collect();
                graph.page(root, &children)
            }

            /// Add `url` linking to `links`
            pub fn page(mut self, url: &str, links: &[&str]) -> Self {
                self.pages.entry(url.to_string()).or_default().links =
                    links.iter().map(ToString::to_string).collect();
                self
            }

            /// Make fetching `url` fail
            pub fn failing(mut self, url: &str) -> Self {
                self.pages.entry(url.to_string()).or_default().fail_fetch = true;
                self
            }

            /// Make every fetch fail
            pub fn failing_everything(mut self) -> Self {
                self.always_fail = true;
                self
            }

            /// Make extracting links from `url` fail
            pub fn broken(mut self, url: &str) -> Self {
                self.pages.entry(url.to_string()).or_default().fail_extract = true;
                self
            }

            pub fn latency(mut self, latency: std::time::Duration) -> Self {
                self.latency = latency;
                self
            }

            pub fn shared(self) -> std::sync::Arc<Self> {
                std::sync::Arc::new(self)
            }

            pub fn fetch_count(&self, url: &str) -> usize {
                self.fetches.lock().unwrap().get(url).copied().unwrap_or_default()
            }

            pub fn total_fetches(&self) -> usize {
                self.fetches.lock().unwrap().values().sum()
            }

            /// Highest number of simultaneous fetches seen for `host`
            pub fn max_active(&self, host: &str) -> usize {
                self.max_active
                    .lock()
                    .unwrap()
                    .get(&HostKey::from(host))
                    .copied()
                    .unwrap_or_default()
            }

            /// Fetches in progress across all hosts right now
            pub fn running(&self) -> usize {
                self.running.load(std::sync::atomic::Ordering::SeqCst)
            }
        }

        impl Downloader for GraphDownloader {
            type Document = GraphDocument;

            fn fetch(&self, url: &str) -> Result<GraphDocument> {
                *self.fetches.lock().unwrap().entry(url.to_string()).or_default() += 1;
                let host = HostKey::parse(url)?;

                self.running.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                {
                    let mut active = self.active.lock().unwrap();
                    let now = active.entry(host.clone()).or_default();
                    *now += 1;
                    let mut max = self.max_active.lock().unwrap();
                    let seen = max.entry(host.clone()).or_default();
                    *seen = (*seen).max(*now);
                }
                if !self.latency.is_zero() {
                    std::thread::sleep(self.latency);
                }
                if let Some(now) = self.active.lock().unwrap().get_mut(&host) {
                    *now -= 1;
                }
                self.running.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);

                if self.always_fail {
                    return Err(ErrorKind::download(format!("{url}: connection refused")));
                }
                match self.pages.get(url) {
                    Some(page) if !page.fail_fetch => Ok(GraphDocument {
                        url: url.to_string(),
                        links: page.links.clone(),
                        broken: page.fail_extract,
                    }),
                    Some(_) => Err(ErrorKind::download(format!("{url}: connection refused"))),
                    None => Err(ErrorKind::download(format!("{url}: 404 Not Found"))),
                }
            }
        }

        impl Document for GraphDocument {
            fn extract_links(&self) -> Result<Vec<String>> {
                if self.broken {
                    return Err(ErrorKind::extract(format!("{} is not valid HTML", self.url)));
                }
                Ok(self.links.clone())
            }
        }
    };
}
