use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashSet;

use super::accumulator::ResultAccumulator;
use super::ticket::Ticket;
use crate::waiter::WaitGuard;
use crate::{Document, Downloader, HostGate, HostParser, HostPermit, WorkerPool};

/// Predicate deciding whether a discovered URL is crawled at all
pub(crate) type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync + 'static>;

/// State of one top-level crawl, shared by every task it spawns.
///
/// Tasks never recurse on a call stack: a download task hands its document
/// to the extractor pool, and an extraction task hands each child URL back
/// to the host gate. Every hand-off carries a [`Ticket`] whose wait guard
/// was registered by the producer.
pub(crate) struct Session<D: Downloader> {
    pub(crate) downloader: Arc<D>,
    pub(crate) host_parser: Arc<dyn HostParser>,
    pub(crate) gate: Arc<HostGate>,
    pub(crate) downloaders: WorkerPool,
    pub(crate) extractors: WorkerPool,
    pub(crate) predicate: Predicate,
    pub(crate) visited: DashSet<String>,
    pub(crate) results: Arc<ResultAccumulator>,
    pub(crate) cancelled: AtomicBool,
}

impl<D: Downloader> Session<D> {
    /// Schedule `url` if it is eligible, unseen and within `depth`.
    ///
    /// `parent` is the guard of the task that discovered `url`. It is
    /// cloned, and so registered, before any work for `url` is handed off.
    pub(crate) fn crawl(self: &Arc<Self>, url: String, depth: usize, parent: &WaitGuard) {
        if depth == 0 {
            return;
        }
        if !(self.predicate)(&url) {
            log::debug!("Skipping {url}: excluded by filter");
            return;
        }
        if !self.visited.insert(url.clone()) {
            return;
        }

        let ticket = Ticket::download(url, Arc::clone(&self.results), parent.clone());
        if self.is_cancelled() {
            // Dropping records the URL as cancelled
            return;
        }

        let host = match self.host_parser.parse_host(ticket.url()) {
            Ok(host) => host,
            Err(e) => return ticket.fail(e),
        };

        let session = Arc::clone(self);
        let task = move |permit: HostPermit| session.download(ticket, permit, depth);
        match self.gate.admit(&host, task, &self.downloaders) {
            Ok(admission) => log::debug!("{host}: {admission:?}"),
            // The task, and with it the ticket, was dropped and recorded
            Err(e) => log::debug!("Could not admit task for {host}: {e}"),
        }
    }

    /// Runs on the download pool while holding a slot of the URL's host
    fn download(self: Arc<Self>, ticket: Ticket, permit: HostPermit, depth: usize) {
        if self.is_cancelled() {
            return;
        }

        let fetched = self.downloader.fetch(ticket.url());
        // The host limit governs connections, not post-processing
        drop(permit);

        let document = match fetched {
            Ok(document) => document,
            Err(e) => return ticket.fail(e),
        };
        log::debug!("Downloaded {}", ticket.url());
        self.results.add_downloaded(ticket.url());

        let ticket = ticket.into_extraction();
        let session = Arc::clone(&self);
        if let Err(e) = self
            .extractors
            .submit(move || session.extract(&document, ticket, depth))
        {
            log::debug!("Could not schedule link extraction: {e}");
        }
    }

    /// Runs on the extractor pool
    fn extract(self: Arc<Self>, document: &D::Document, ticket: Ticket, depth: usize) {
        if self.is_cancelled() {
            return;
        }
        match document.extract_links() {
            Ok(links) => {
                log::debug!("Found {} link(s) in {}", links.len(), ticket.url());
                for link in links {
                    self.crawl(link, depth - 1, ticket.guard());
                }
                ticket.resolve();
            }
            Err(e) => ticket.fail(e),
        }
    }

    /// Stop scheduling new work. Tasks that have not started yet are
    /// discarded and recorded as cancelled when they come up.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
