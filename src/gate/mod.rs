//! Per-host admission control.
//!
//! Bounds the number of simultaneous downloads from any single host,
//! independently of how many worker threads the download pool has. Excess
//! work is parked in a FIFO queue per host and started as soon as a running
//! task for that host finishes.
//!
//! # Architecture
//!
//! - [`HostKey`]: Represents a hostname/domain
//! - [`Host`]: Active count, limit and pending queue of one host
//! - [`HostGate`]: Creates hosts on demand and routes tasks to them
//! - [`HostConfig`]: Per-host limit overrides
//! - [`HostStats`]: Statistics tracking for each host

mod config;
mod host;
mod key;
mod stats;

use dashmap::DashMap;
use std::sync::Arc;

pub use config::{DEFAULT_PER_HOST, HostConfig, HostConfigs};
pub use host::{Admission, Host, HostPermit};
pub use key::HostKey;
pub use stats::{HostStats, HostStatsMap};

use crate::{ErrorKind, Result, WorkerPool};

/// Routes tasks to per-host queues and enforces per-host limits.
///
/// Hosts are created lazily when first seen and kept for the lifetime of
/// the gate, so repeated crawls of the same host reuse its entry.
#[derive(Debug)]
pub struct HostGate {
    /// Map of hostname to Host instances, created on-demand
    hosts: DashMap<HostKey, Arc<Host>>,
    /// Limit for hosts without an override
    default_limit: usize,
    /// Per-host limit overrides
    host_configs: HostConfigs,
}

impl HostGate {
    /// Create a gate allowing `default_limit` concurrent tasks per host.
    ///
    /// # Errors
    ///
    /// Fails if `default_limit` or any override is zero: such a host could
    /// never make progress.
    pub fn new(default_limit: usize, host_configs: HostConfigs) -> Result<Self> {
        if default_limit == 0 {
            return Err(ErrorKind::InvalidPoolSize("per-host limit"));
        }
        if host_configs.values().any(|c| c.concurrency == Some(0)) {
            return Err(ErrorKind::InvalidPoolSize("per-host limit override"));
        }
        Ok(Self {
            hosts: DashMap::new(),
            default_limit,
            host_configs,
        })
    }

    /// Start `task` on `pool` if `host` has a free slot, otherwise queue it
    /// behind the host's other waiting tasks.
    ///
    /// The task receives a [`HostPermit`]; the slot is held until the permit
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PoolClosed`] if the pool no longer accepts work.
    /// The task is dropped without running in that case.
    pub fn admit<F>(&self, host: &HostKey, task: F, pool: &WorkerPool) -> Result<Admission>
    where
        F: FnOnce(HostPermit) + Send + 'static,
    {
        let host = self.get_or_create_host(host);
        host.admit(Box::new(task), pool)
    }

    /// Get an existing host or create a new one for the given hostname
    fn get_or_create_host(&self, host_key: &HostKey) -> Arc<Host> {
        if let Some(host) = self.hosts.get(host_key) {
            return Arc::clone(host.value());
        }

        let limit = self
            .host_configs
            .get(host_key)
            .map_or(self.default_limit, |c| {
                c.effective_concurrency(self.default_limit)
            });

        // Another thread may have created it in the meantime, use theirs
        Arc::clone(
            self.hosts
                .entry(host_key.clone())
                .or_insert_with(|| Arc::new(Host::new(host_key.clone(), limit)))
                .value(),
        )
    }

    /// Limit that applies to `host`
    #[must_use]
    pub fn limit_for(&self, host: &HostKey) -> usize {
        self.host_configs
            .get(host)
            .map_or(self.default_limit, |c| {
                c.effective_concurrency(self.default_limit)
            })
    }

    /// Get statistics for a specific host
    ///
    /// Returns empty stats for hosts that were never seen.
    #[must_use]
    pub fn host_stats(&self, hostname: &str) -> HostStats {
        let host_key = HostKey::from(hostname);
        self.hosts
            .get(&host_key)
            .map(|host| host.stats())
            .unwrap_or_default()
    }

    /// Get statistics for all hosts that have been created
    #[must_use]
    pub fn all_host_stats(&self) -> HostStatsMap {
        self.hosts
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().stats()))
            .collect::<std::collections::HashMap<_, _>>()
            .into()
    }

    /// Get the number of hosts seen so far
    #[must_use]
    pub fn active_host_count(&self) -> usize {
        self.hosts.len()
    }
}
