//! Crawler settings that can be loaded from a TOML file.
//!
//! ```toml
//! downloaders = 16
//! extractors = 4
//! per_host = 2
//! timeout = "2m 30s"
//! same_host = true
//! exclude = ['\.pdf$']
//!
//! [hosts."slow.example.com"]
//! concurrency = 1
//! ```
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crawler::{DEFAULT_DOWNLOADERS, DEFAULT_EXTRACTORS};
use crate::{DEFAULT_PER_HOST, ErrorKind, HostConfigs, Result};

/// Settings for a [`crate::WebCrawler`]. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CrawlerConfig {
    /// Number of download worker threads
    pub downloaders: usize,
    /// Number of link extraction worker threads
    pub extractors: usize,
    /// Default maximum of simultaneous downloads per host
    pub per_host: usize,
    /// Per-host overrides of `per_host`
    #[serde(skip_serializing_if = "HostConfigs::is_empty")]
    pub hosts: HostConfigs,
    /// Deadline for a whole crawl, e.g. `30s` or `5m`
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Only crawl URLs matching one of these regular expressions
    pub include: Vec<String>,
    /// Skip URLs matching one of these regular expressions
    pub exclude: Vec<String>,
    /// Stay on the host of the root URL
    pub same_host: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: DEFAULT_DOWNLOADERS,
            extractors: DEFAULT_EXTRACTORS,
            per_host: DEFAULT_PER_HOST,
            hosts: HostConfigs::new(),
            timeout: None,
            include: Vec::new(),
            exclude: Vec::new(),
            same_host: false,
        }
    }
}

impl CrawlerConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML, unknown keys, or values of the wrong type.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse, see
    /// [`CrawlerConfig::from_toml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ErrorKind::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        log::debug!("Loaded crawler config from {}", path.display());
        Ok(config)
    }
}
