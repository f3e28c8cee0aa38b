use std::any::Any;
use std::path::PathBuf;
use thiserror::Error;

use crate::MapError;

/// Boxed error returned by a [`crate::Downloader`] or [`crate::Document`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Possible errors when crawling with `trawler`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The given string can not be parsed into a valid URL
    #[error("Cannot parse `{0}` as URL: {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    /// An URL without a host was found
    #[error("URL `{0}` is missing a host")]
    InvalidUrlHost(String),
    /// Fetching a document failed
    #[error("Download failed: {0}")]
    Download(#[source] BoxError),
    /// Extracting links from a downloaded document failed
    #[error("Link extraction failed: {0}")]
    Extract(#[source] BoxError),
    /// The task was discarded before it ran, either because the pool was
    /// aborted or the crawl deadline expired
    #[error("Task was cancelled before it could run")]
    Cancelled,
    /// The task panicked while running
    #[error("Task panicked: {0}")]
    TaskPanicked(String),
    /// Work was submitted to a pool which no longer accepts it
    #[error("Worker pool is closed")]
    PoolClosed,
    /// A worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    SpawnWorker(#[source] std::io::Error),
    /// A pool or gate was configured with a size of zero
    #[error("Invalid size for {0}: must be at least 1")]
    InvalidPoolSize(&'static str),
    /// New work was registered after all outstanding work finished
    #[error("Cannot register work: the tracker already reached zero")]
    QuiescenceReached,
    /// One or more worker threads panicked; every failure is kept
    #[error("{} worker thread(s) failed to join: {}", .0.len(), .0.join("; "))]
    Join(Vec<String>),
    /// Some chunks of a parallel operation failed. Holds the index and
    /// cause of every failed chunk.
    #[error("{} parallel task(s) failed: {}", .0.len(), format_failures(.0))]
    TasksFailed(Vec<(usize, ErrorKind)>),
    /// The config file could not be read
    #[error("Failed to read config `{}`: {source}", .path.display())]
    ReadConfig {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The config file is not valid TOML or has unknown keys
    #[error("Failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),
    /// A filter pattern is not a valid regular expression
    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl ErrorKind {
    /// Wrap any error produced while fetching a document
    pub fn download<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Download(err.into())
    }

    /// Wrap any error produced while extracting links
    pub fn extract<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Extract(err.into())
    }

    /// Build a [`ErrorKind::TaskPanicked`] from a caught panic payload
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::TaskPanicked(panic_message(payload))
    }

    /// Whether this failure came from shutting the crawl down rather than
    /// from the URL itself
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::PoolClosed)
    }
}

impl<R> From<MapError<R>> for ErrorKind {
    fn from(err: MapError<R>) -> Self {
        Self::TasksFailed(err.failures)
    }
}

fn format_failures(failures: &[(usize, ErrorKind)]) -> String {
    failures
        .iter()
        .map(|(index, err)| format!("#{index}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Best-effort conversion of a panic payload into a readable message
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("<non-string panic payload>")
    }
}
