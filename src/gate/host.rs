use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::key::HostKey;
use super::stats::HostStats;
use crate::utils::lock;
use crate::{ErrorKind, Result, WorkerPool};

/// Work waiting for a slot on a host. It receives the [`HostPermit`] which
/// keeps the slot occupied while the task runs.
pub(crate) type GateTask = Box<dyn FnOnce(HostPermit) + Send + 'static>;

/// Whether [`crate::HostGate::admit`] started the task or parked it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The task was submitted to the pool right away
    Started,
    /// The host is at its limit; the task waits in the host's queue
    Queued,
}

/// A single host with its own concurrency limit and FIFO queue of tasks
/// waiting for a free slot.
///
/// A task is either running (and holds a [`HostPermit`]) or sitting in
/// exactly one host's queue, never both.
pub struct Host {
    /// The hostname this instance manages
    pub key: HostKey,
    limit: usize,
    state: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
    active: usize,
    pending: VecDeque<GateTask>,
    stats: HostStats,
}

impl Host {
    pub(crate) fn new(key: HostKey, limit: usize) -> Self {
        Self {
            key,
            limit,
            state: Mutex::new(HostState::default()),
        }
    }

    /// Maximum number of simultaneously active tasks
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of tasks currently holding a slot
    #[must_use]
    pub fn active(&self) -> usize {
        lock(&self.state).active
    }

    /// Number of tasks waiting for a slot
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// Snapshot of this host's statistics
    #[must_use]
    pub fn stats(&self) -> HostStats {
        lock(&self.state).stats
    }

    pub(crate) fn admit(self: &Arc<Self>, task: GateTask, pool: &WorkerPool) -> Result<Admission> {
        if pool.is_closed() {
            return Err(ErrorKind::PoolClosed);
        }
        {
            let mut state = lock(&self.state);
            if state.active >= self.limit {
                state.stats.record_admission(None);
                state.pending.push_back(task);
                log::debug!(
                    "Host {} at limit {}, queued task ({} waiting)",
                    self.key,
                    self.limit,
                    state.pending.len()
                );
                return Ok(Admission::Queued);
            }
            state.active += 1;
            let active = state.active;
            state.stats.record_admission(Some(active));
        }
        self.dispatch(task, pool)?;
        Ok(Admission::Started)
    }

    /// Submit a task which already owns one of the host's slots
    fn dispatch(self: &Arc<Self>, task: GateTask, pool: &WorkerPool) -> Result<()> {
        let permit = HostPermit {
            host: Arc::clone(self),
            pool: pool.clone(),
        };
        // On failure the closure, and with it the permit, is dropped, which
        // gives the slot back.
        pool.submit(move || task(permit))
    }

    /// Hand the slot of a finished task to the next queued task, or free it.
    fn release(self: &Arc<Self>, pool: &WorkerPool) {
        let (next, discarded) = {
            let mut state = lock(&self.state);
            state.stats.record_completion();
            if pool.is_closed() {
                state.active -= 1;
                (None, std::mem::take(&mut state.pending))
            } else if let Some(next) = state.pending.pop_front() {
                (Some(next), VecDeque::new())
            } else {
                state.active -= 1;
                (None, VecDeque::new())
            }
        };

        // Dropped outside the lock, their destructors may report back
        if !discarded.is_empty() {
            log::debug!(
                "Pool `{}` closed, discarding {} task(s) queued for {}",
                pool.name(),
                discarded.len(),
                self.key
            );
        }
        drop(discarded);

        if let Some(task) = next {
            if let Err(e) = self.dispatch(task, pool) {
                log::debug!("Could not hand slot of {} to queued task: {e}", self.key);
            }
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Host")
            .field("key", &self.key)
            .field("limit", &self.limit)
            .field("active", &state.active)
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Proof that a task holds one of a host's slots.
///
/// Dropping the permit releases the slot: the oldest queued task for the
/// host takes it over, or the active count goes down. Drop it as soon as
/// the host is no longer being talked to.
pub struct HostPermit {
    host: Arc<Host>,
    pool: WorkerPool,
}

impl HostPermit {
    /// The host this permit belongs to
    #[must_use]
    pub fn host(&self) -> &HostKey {
        &self.host.key
    }
}

impl fmt::Debug for HostPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostPermit")
            .field("host", &self.host.key)
            .finish()
    }
}

impl Drop for HostPermit {
    fn drop(&mut self) {
        self.host.release(&self.pool);
    }
}
