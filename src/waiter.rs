//! Facility to wait for a dynamic set of tasks to complete, with a single
//! waiter and multiple waitees (things that are waited for). Notably, each
//! waitee can also start more work to be waited for.
//!
//! # Implementation Details
//!
//! A [`WaitGroup`] is a counter of outstanding units of work plus a
//! [`Condvar`] which is signalled when the counter drops to zero. The
//! counter starts at one, representing the party that created the group.
//!
//! Work is registered by the *producer* before it hands the work off, never
//! by the consumer after it started. Otherwise the counter could touch zero
//! while a task is about to register children.
//!
//! [`WaitGuard`] wraps one registration in RAII: cloning a guard registers
//! one more unit, dropping a guard arrives. A guard that is dropped without
//! ever running (for example because its task was discarded on shutdown)
//! therefore still balances the count.
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::utils::lock;
use crate::{ErrorKind, Result};

/// Counter of outstanding work that a single waiter can block on.
///
/// Once the count reaches zero the group is finished and further
/// registrations are rejected.
#[derive(Clone)]
pub struct WaitGroup {
    state: Arc<State>,
}

struct State {
    outstanding: AtomicUsize,
    lock: Mutex<()>,
    zero: Condvar,
}

/// RAII guard held by a task which is being waited for.
///
/// The existence of values of this type represents outstanding work for
/// its corresponding [`WaitGroup`].
///
/// A [`WaitGuard`] can be cloned using [`WaitGuard::clone`]. This allows
/// a task to spawn additional tasks, recursively.
pub struct WaitGuard {
    state: Arc<State>,
}

impl WaitGroup {
    /// Creates a new [`WaitGroup`] and the guard for its initial unit of
    /// work.
    ///
    /// The group cannot finish before the returned guard is dropped.
    #[must_use]
    pub fn new() -> (Self, WaitGuard) {
        let state = Arc::new(State {
            outstanding: AtomicUsize::new(1),
            lock: Mutex::new(()),
            zero: Condvar::new(),
        });
        let guard = WaitGuard {
            state: Arc::clone(&state),
        };
        (Self { state }, guard)
    }

    /// Number of registered units that have not arrived yet
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.state.outstanding.load(Ordering::Acquire)
    }

    /// Whether every registered unit has arrived
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outstanding() == 0
    }

    /// Register `n` more units of work.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::QuiescenceReached`] if the count already
    /// dropped to zero.
    pub fn register(&self, n: usize) -> Result<()> {
        self.state
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != 0).then(|| current + n)
            })
            .map(|_| ())
            .map_err(|_| ErrorKind::QuiescenceReached)
    }

    /// Register one unit of work and wrap it in a guard.
    ///
    /// # Errors
    ///
    /// See [`WaitGroup::register`].
    pub fn guard(&self) -> Result<WaitGuard> {
        self.register(1)?;
        Ok(WaitGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Mark one unit of work registered with [`WaitGroup::register`] as
    /// done.
    ///
    /// Calling this more often than units were registered is a bug; the
    /// extra call is logged and ignored.
    pub fn arrive(&self) {
        self.state.arrive();
    }

    /// Block the calling thread until every registered unit has arrived.
    pub fn wait(&self) {
        let mut guard = lock(&self.state.lock);
        while self.outstanding() != 0 {
            guard = self
                .state
                .zero
                .wait(guard)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Like [`WaitGroup::wait`], but give up after `timeout`.
    ///
    /// Returns `true` if the count reached zero in time. A timeout too large
    /// to be represented as a deadline waits without limit.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut guard = lock(&self.state.lock);
        while self.outstanding() != 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .state
                .zero
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .0;
        }
        true
    }
}

impl State {
    fn arrive(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            });
        match previous {
            Ok(1) => {
                // Take the lock so the notification cannot slip in between
                // the waiter's check and its wait.
                let _guard = lock(&self.lock);
                self.zero.notify_all();
            }
            Ok(_) => {}
            Err(_) => log::error!("Arrived at a wait group with no outstanding work"),
        }
    }
}

impl Clone for WaitGuard {
    fn clone(&self) -> Self {
        // `self` is outstanding, so the count is at least one and the
        // registration cannot race with the group finishing.
        self.state.outstanding.fetch_add(1, Ordering::AcqRel);
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.state.arrive();
    }
}

impl fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitGroup")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

impl fmt::Debug for WaitGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitGuard")
            .field(
                "outstanding",
                &self.state.outstanding.load(Ordering::Acquire),
            )
            .finish()
    }
}

/// Demonstrates use of the [`WaitGroup`] and [`WaitGuard`] to (very
/// inefficiently) compute the Fibonacci number `F(n)` on plain threads.
///
/// Each task spawns the tasks for `n - 1` and `n - 2`, handing each of them a
/// clone of its guard, and the caller only knows the total once the group
/// finished.
#[cfg(test)]
fn fibonacci_waiter_example(n: usize) -> usize {
    use std::sync::atomic::AtomicUsize;

    fn task(n: usize, guard: WaitGuard, count: Arc<AtomicUsize>) {
        match n {
            0 => {}
            1 => {
                count.fetch_add(1, Ordering::SeqCst);
            }
            n => {
                for next in [n - 1, n - 2] {
                    let guard = guard.clone();
                    let count = Arc::clone(&count);
                    std::thread::spawn(move || task(next, guard, count));
                }
            }
        }
    }

    let count = Arc::new(AtomicUsize::new(0));
    let (waiter, guard) = WaitGroup::new();
    task(n, guard, Arc::clone(&count));
    waiter.wait();
    count.load(Ordering::SeqCst)
}
