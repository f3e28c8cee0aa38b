//! Seams between the crawler and the outside world.
//!
//! The crawler does no network I/O and no HTML parsing itself. It asks a
//! [`Downloader`] for a [`Document`] and asks the document for its links.
//! Host names are derived by a [`HostParser`].
use std::sync::Arc;

use crate::{HostKey, Result};

/// A downloaded page that can list the URLs it links to
pub trait Document: Send + 'static {
    /// Return every link found in the document.
    ///
    /// Links should be absolute URLs; relative ones are the document's job
    /// to resolve.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::Extract`] (or any other kind) if the
    /// document cannot be parsed.
    fn extract_links(&self) -> Result<Vec<String>>;
}

/// Fetches documents. May block; the crawler calls it from its download
/// workers only.
pub trait Downloader: Send + Sync + 'static {
    /// Document type produced by this downloader
    type Document: Document;

    /// Fetch `url`.
    ///
    /// # Errors
    ///
    /// Transient and permanent failures alike are reported for `url` and
    /// never stop the crawl. Use [`crate::ErrorKind::download`] to wrap
    /// arbitrary errors.
    fn fetch(&self, url: &str) -> Result<Self::Document>;
}

impl<D: Downloader> Downloader for Arc<D> {
    type Document = D::Document;

    fn fetch(&self, url: &str) -> Result<Self::Document> {
        (**self).fetch(url)
    }
}

/// Derives the host that per-host limits are keyed on
pub trait HostParser: Send + Sync + 'static {
    /// Extract the host of `url`.
    ///
    /// # Errors
    ///
    /// A parse failure is recorded against `url`; the URL is never
    /// downloaded.
    fn parse_host(&self, url: &str) -> Result<HostKey>;
}

/// Default [`HostParser`], based on the WHATWG URL parser
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlHostParser;

impl HostParser for UrlHostParser {
    fn parse_host(&self, url: &str) -> Result<HostKey> {
        HostKey::parse(url)
    }
}

impl<F> HostParser for F
where
    F: Fn(&str) -> Result<HostKey> + Send + Sync + 'static,
{
    fn parse_host(&self, url: &str) -> Result<HostKey> {
        self(url)
    }
}
