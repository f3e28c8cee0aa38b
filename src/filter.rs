//! Decides which discovered URLs are eligible for traversal.
//!
//! The filter runs before a URL is marked as visited, so an excluded URL is
//! neither downloaded nor reported.
use std::collections::HashSet;

use regex::RegexSet;
use url::Url;

use crate::{HostKey, Result};

/// A generic URL filter.
/// Used to decide if a given URL should be crawled or skipped.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// URLs explicitly included for crawling. This takes precedence over excludes
    pub includes: Option<RegexSet>,
    /// URLs excluded from crawling
    pub excludes: Option<RegexSet>,
    /// Only crawl URLs on one of these hosts. Empty means any host.
    pub hosts: HashSet<HostKey>,
    /// Only crawl URLs with the given schemes (e.g. `https` and `http`).
    /// Empty means any scheme.
    pub schemes: HashSet<String>,
}

impl Filter {
    /// Build a filter from include and exclude patterns.
    ///
    /// # Errors
    ///
    /// Fails if any pattern is not a valid regular expression.
    pub fn from_patterns<I, E>(includes: I, excludes: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let includes = RegexSet::new(includes)?;
        let excludes = RegexSet::new(excludes)?;
        Ok(Self {
            includes: (!includes.is_empty()).then_some(includes),
            excludes: (!excludes.is_empty()).then_some(excludes),
            ..Self::default()
        })
    }

    /// Only allow URLs on the same host as `root`, over HTTP(S).
    ///
    /// # Errors
    ///
    /// Fails if `root` has no host.
    pub fn same_host(root: &str) -> Result<Self> {
        Ok(Self::default().with_host(HostKey::parse(root)?).with_http_only())
    }

    /// Add `host` to the allow-list
    #[must_use]
    pub fn with_host(mut self, host: HostKey) -> Self {
        self.hosts.insert(host);
        self
    }

    /// Restrict crawling to `http` and `https` URLs
    #[must_use]
    pub fn with_http_only(mut self) -> Self {
        self.schemes.insert("http".to_string());
        self.schemes.insert("https".to_string());
        self
    }

    #[inline]
    fn is_includes_match(&self, input: &str) -> bool {
        matches!(self.includes, Some(ref includes) if includes.is_match(input))
    }

    #[inline]
    fn is_excludes_match(&self, input: &str) -> bool {
        matches!(self.excludes, Some(ref excludes) if excludes.is_match(input))
    }

    /// Whether the host or scheme of `url` is outside the allowed sets.
    ///
    /// URLs that do not parse are not excluded here; the crawler reports
    /// them as errors instead.
    fn is_location_excluded(&self, url: &str) -> bool {
        if self.hosts.is_empty() && self.schemes.is_empty() {
            return false;
        }
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !self.schemes.is_empty() && !self.schemes.contains(parsed.scheme()) {
            return true;
        }
        if self.hosts.is_empty() {
            return false;
        }
        match HostKey::try_from(&parsed) {
            Ok(host) => !self.hosts.contains(&host),
            Err(_) => true,
        }
    }

    /// Determine whether a given URL should be skipped.
    ///
    /// # Details
    ///
    /// 1. A URL outside the allowed hosts or schemes is excluded.
    /// 2. A URL matching the includes is *explicitly included*; includes take
    ///    precedence over excludes.
    /// 3. When includes are set but don't match, the URL is *presumably
    ///    excluded*.
    /// 4. Otherwise the URL is excluded only if it matches the excludes.
    #[must_use]
    pub fn is_excluded(&self, url: &str) -> bool {
        if self.is_location_excluded(url) {
            return true;
        }
        if self.is_includes_match(url) {
            return false;
        }
        if self.includes.is_some() {
            return true;
        }
        self.is_excludes_match(url)
    }

    /// Inverse of [`Filter::is_excluded`], usable as a crawl predicate
    #[must_use]
    pub fn is_allowed(&self, url: &str) -> bool {
        !self.is_excluded(url)
    }
}
