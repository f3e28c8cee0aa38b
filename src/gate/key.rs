use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::{ErrorKind, Result};

/// A type-safe representation of a hostname for per-host admission.
///
/// This extracts and normalizes hostnames from URLs to ensure consistent
/// limits across requests to the same host (domain or IP address).
///
/// # Examples
///
/// ```
/// use trawler::HostKey;
///
/// let host_key = HostKey::parse("https://api.github.com/repos/user/repo").unwrap();
/// assert_eq!(host_key.as_str(), "api.github.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HostKey(String);

impl HostKey {
    /// Parse `url` and extract its host.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidUrl`] if `url` is not a URL and with
    /// [`ErrorKind::InvalidUrlHost`] if it has no host (e.g. `file:` or
    /// `mailto:` URLs).
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| ErrorKind::InvalidUrl(url.to_string(), e))?;
        Self::try_from(&parsed)
    }

    /// Get the hostname as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| ErrorKind::InvalidUrlHost(url.to_string()))?;

        // Normalize to lowercase for consistent lookup
        Ok(HostKey(host.to_lowercase()))
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostKey {
    fn from(host: String) -> Self {
        HostKey(host.to_lowercase())
    }
}

impl From<&str> for HostKey {
    fn from(host: &str) -> Self {
        HostKey(host.to_lowercase())
    }
}

impl From<HostKey> for String {
    fn from(key: HostKey) -> Self {
        key.0
    }
}
