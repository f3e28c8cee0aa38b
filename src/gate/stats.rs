use std::collections::HashMap;

use serde::Serialize;

/// A [`HashMap`] mapping hosts to their [`HostStats`]
#[derive(Debug, Default, Serialize)]
pub struct HostStatsMap(HashMap<String, HostStats>);

impl HostStatsMap {
    /// Sort host statistics by number of admitted tasks (descending order)
    #[must_use]
    pub fn sorted(&self) -> Vec<(String, HostStats)> {
        let mut sorted_hosts: Vec<_> = self.0.clone().into_iter().collect();
        sorted_hosts.sort_by_key(|(_, stats)| std::cmp::Reverse(stats.admitted));
        sorted_hosts
    }

    /// Statistics of a single host, if it was seen
    #[must_use]
    pub fn get(&self, host: &str) -> Option<&HostStats> {
        self.0.get(&host.to_lowercase())
    }

    /// Number of hosts with statistics
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no host was seen yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, HostStats>> for HostStatsMap {
    fn from(value: HashMap<String, HostStats>) -> Self {
        Self(value)
    }
}

/// Record and report admission statistics for a [`crate::Host`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    /// Tasks handed to the gate for this host
    pub admitted: u64,
    /// Tasks that had to wait in the pending queue
    pub queued: u64,
    /// Tasks that finished and gave their slot back
    pub completed: u64,
    /// Highest number of simultaneously active tasks observed
    pub max_active: usize,
}

impl HostStats {
    /// Record a task entering the gate; `active` is the count after it
    /// started, or `None` if it was queued
    pub(crate) fn record_admission(&mut self, active: Option<usize>) {
        self.admitted += 1;
        match active {
            Some(active) => self.max_active = self.max_active.max(active),
            None => self.queued += 1,
        }
    }

    /// Record a task giving its slot back
    pub(crate) fn record_completion(&mut self) {
        self.completed += 1;
    }

    /// Fraction of admitted tasks that had to wait (0.0 to 1.0)
    #[must_use]
    pub fn queue_rate(&self) -> f64 {
        if self.admitted == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.queued as f64 / self.admitted as f64;
        rate
    }
}
