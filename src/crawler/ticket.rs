use std::sync::Arc;

use super::accumulator::ResultAccumulator;
use crate::ErrorKind;
use crate::waiter::WaitGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Download,
    Extract,
}

/// One registered unit of crawl work for a single URL.
///
/// Holding a ticket keeps the crawl's wait group from finishing. A ticket
/// must be settled with [`Ticket::resolve`] or [`Ticket::fail`]; one that is
/// dropped unsettled (its task was discarded, or panicked) records
/// [`ErrorKind::Cancelled`] or [`ErrorKind::TaskPanicked`] for its URL.
/// The error is recorded before the wait guard arrives.
#[derive(Debug)]
pub(crate) struct Ticket {
    url: String,
    phase: Phase,
    results: Arc<ResultAccumulator>,
    guard: WaitGuard,
    settled: bool,
}

impl Ticket {
    /// Ticket for downloading `url`. `guard` must already be registered.
    pub(crate) fn download(url: String, results: Arc<ResultAccumulator>, guard: WaitGuard) -> Self {
        Self {
            url,
            phase: Phase::Download,
            results,
            guard,
            settled: false,
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn guard(&self) -> &WaitGuard {
        &self.guard
    }

    /// Settle the download and register the extraction phase in its place
    pub(crate) fn into_extraction(mut self) -> Self {
        debug_assert_eq!(self.phase, Phase::Download);
        let next = Self {
            url: self.url.clone(),
            phase: Phase::Extract,
            results: Arc::clone(&self.results),
            guard: self.guard.clone(),
            settled: false,
        };
        self.settled = true;
        next
    }

    pub(crate) fn resolve(mut self) {
        self.settled = true;
    }

    pub(crate) fn fail(mut self, err: ErrorKind) {
        self.record(err);
        self.settled = true;
    }

    fn record(&self, err: ErrorKind) {
        match self.phase {
            Phase::Download => self.results.add_error(&self.url, err),
            Phase::Extract => self.results.add_link_error(&self.url, err),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let err = if std::thread::panicking() {
            ErrorKind::TaskPanicked(format!("{:?} of {} unwound", self.phase, self.url))
        } else {
            ErrorKind::Cancelled
        };
        self.record(err);
    }
}
