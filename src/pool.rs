//! Fixed-size pool of OS worker threads fed from one shared queue.
//!
//! [`WorkerPool`] is cheap to clone; every clone refers to the same set of
//! workers. Tasks are plain closures. A task that is discarded without
//! running (because the pool was aborted) is simply dropped, so any RAII
//! guard it captured still runs its `Drop` impl. The crawler relies on this
//! to keep its bookkeeping balanced under forced shutdown.
//!
//! ```
//! use trawler::WorkerPool;
//!
//! let pool = WorkerPool::new("squares", 4).unwrap();
//! let squares = pool.map((1..=5).collect(), |n: u32| n * n).unwrap();
//! assert_eq!(squares, vec![1, 4, 9, 16, 25]);
//! pool.close(trawler::ShutdownMode::Graceful).unwrap();
//! ```
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::types::panic_message;
use crate::utils::lock;
use crate::{ErrorKind, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// How [`WorkerPool::close`] treats work that is still queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Run every queued task, then stop the workers
    Graceful,
    /// Drop queued tasks without running them. Tasks already running
    /// finish normally.
    Abort,
}

/// A fixed number of persistent worker threads pulling from a shared queue
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    size: usize,
    /// `None` once the pool was closed
    sender: Mutex<Option<Sender<Job>>>,
    aborted: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `size` worker threads named `<name>-<index>`.
    ///
    /// # Errors
    ///
    /// Fails if `size` is zero or a thread cannot be spawned. Threads that
    /// were already started are shut down again.
    pub fn new(name: impl Into<String>, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ErrorKind::InvalidPoolSize("worker pool"));
        }
        let name = name.into();
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let aborted = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let receiver = receiver.clone();
            let aborted = Arc::clone(&aborted);
            let spawned = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || work(&receiver, &aborted));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Disconnect the channel so the threads we did start exit
                    drop(sender);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(ErrorKind::SpawnWorker(e));
                }
            }
        }
        log::debug!("Started worker pool `{name}` with {size} thread(s)");

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                size,
                sender: Mutex::new(Some(sender)),
                aborted,
                workers: Mutex::new(workers),
            }),
        })
    }

    /// Name given to the pool at construction
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of worker threads
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Whether [`WorkerPool::close`] was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.inner.sender).is_none()
    }

    /// Queue `task` for execution by one of the workers.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PoolClosed`] once the pool was closed. The
    /// task is dropped in that case.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        // Clone the sender out so that no lock is held while a rejected task
        // is dropped; its destructor may submit again.
        let sender = lock(&self.inner.sender).clone();
        let Some(sender) = sender else {
            return Err(ErrorKind::PoolClosed);
        };
        sender
            .send(Box::new(task))
            .map_err(|_| ErrorKind::PoolClosed)
    }

    /// Apply `f` to every item on the workers and block until all of them
    /// finished. Results keep the order of `items`.
    ///
    /// Must not be called from one of this pool's own workers: the caller
    /// blocks and would hold a thread the tasks need.
    ///
    /// # Errors
    ///
    /// If any item panicked, was cancelled, or could not be submitted, the
    /// returned [`MapError`] carries every failure along with the results
    /// that did complete.
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> std::result::Result<Vec<R>, MapError<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let total = items.len();
        let f = Arc::new(f);
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut submitted = 0;
        for (index, item) in items.into_iter().enumerate() {
            let f = Arc::clone(&f);
            let tx = tx.clone();
            let task = move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(item)))
                    .map_err(|payload| ErrorKind::from_panic(payload.as_ref()));
                // The receiver outlives every task, see below
                let _ = tx.send((index, outcome));
            };
            if self.submit(task).is_err() {
                break;
            }
            submitted += 1;
        }
        // Every task holds a sender; the channel disconnects once each task
        // either reported or was dropped unexecuted.
        drop(tx);

        let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut failed = vec![false; total];
        let mut failures = Vec::new();
        for (index, outcome) in rx {
            match outcome {
                Ok(value) => results[index] = Some(value),
                Err(err) => {
                    failed[index] = true;
                    failures.push((index, err));
                }
            }
        }

        for (index, slot) in results.iter().enumerate() {
            if slot.is_some() || failed[index] {
                continue;
            }
            let err = if index < submitted {
                ErrorKind::Cancelled
            } else {
                ErrorKind::PoolClosed
            };
            failures.push((index, err));
        }

        if failures.is_empty() {
            return Ok(results.into_iter().flatten().collect());
        }
        failures.sort_by_key(|(index, _)| *index);
        log::warn!(
            "{} of {total} task(s) on pool `{}` failed",
            failures.len(),
            self.inner.name
        );
        Err(MapError { results, failures })
    }

    /// Stop accepting work and wait for the workers to exit.
    ///
    /// Calling this more than once is harmless. When called from one of the
    /// pool's own workers, that worker is not joined.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Join`] listing every worker thread that
    /// panicked.
    pub fn close(&self, mode: ShutdownMode) -> Result<()> {
        if mode == ShutdownMode::Abort {
            self.inner.aborted.store(true, Ordering::Release);
        }
        let sender = lock(&self.inner.sender).take();
        if sender.is_some() {
            log::debug!("Closing worker pool `{}` ({mode:?})", self.inner.name);
        }
        drop(sender);

        let handles = std::mem::take(&mut *lock(&self.inner.workers));
        let current = thread::current().id();
        let mut failures = Vec::new();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if let Err(payload) = handle.join() {
                failures.push(format!("{name}: {}", panic_message(payload.as_ref())));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ErrorKind::Join(failures))
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.inner.name)
            .field("size", &self.inner.size)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Disconnect so idle workers exit. They are not joined here: the last
        // handle may be dropped on a worker thread.
        self.sender
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
    }
}

/// Worker loop: block on the queue, run one task, repeat until the queue
/// is disconnected and drained.
fn work(receiver: &Receiver<Job>, aborted: &AtomicBool) {
    for job in receiver {
        if aborted.load(Ordering::Acquire) {
            drop(job);
            continue;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let name = thread::current().name().unwrap_or("<unnamed>").to_string();
            log::error!(
                "Task on `{name}` panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

/// Failure of [`WorkerPool::map`]: at least one item did not produce a value.
pub struct MapError<R> {
    /// Results in input order; `None` where the item failed
    pub results: Vec<Option<R>>,
    /// Index and cause of every failed item, sorted by index
    pub failures: Vec<(usize, ErrorKind)>,
}

impl<R> MapError<R> {
    /// Values of the items that did complete, in input order
    #[must_use]
    pub fn into_partial(self) -> Vec<R> {
        self.results.into_iter().flatten().collect()
    }
}

impl<R> fmt::Debug for MapError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapError")
            .field("total", &self.results.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl<R> fmt::Display for MapError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} task(s) failed, results are incomplete",
            self.failures.len(),
            self.results.len()
        )?;
        for (index, err) in &self.failures {
            write!(f, "; #{index}: {err}")?;
        }
        Ok(())
    }
}

impl<R> std::error::Error for MapError<R> {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            WorkerPool::new("empty", 0),
            Err(ErrorKind::InvalidPoolSize(_))
        ));
    }

    #[test]
    fn test_map_keeps_order() {
        let pool = WorkerPool::new("map", 3).unwrap();
        let out = pool
            .map((0..100).collect(), |n: usize| {
                thread::sleep(Duration::from_micros((100 - n) as u64));
                n * 2
            })
            .unwrap();
        assert_eq!(out, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_empty() {
        let pool = WorkerPool::new("map", 1).unwrap();
        let out: Vec<u8> = pool.map(Vec::<u8>::new(), |n| n).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_map_collects_every_panic() {
        let pool = WorkerPool::new("panics", 2).unwrap();
        let err = pool
            .map(vec![1, 2, 3, 4], |n: i32| {
                assert!(n % 2 == 1, "even input {n}");
                n
            })
            .unwrap_err();

        let failed: Vec<usize> = err.failures.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![1, 3]);
        assert!(matches!(err.failures[0].1, ErrorKind::TaskPanicked(ref m) if m.contains("even input 2")));
        assert_eq!(err.into_partial(), vec![1, 3]);
    }

    #[test]
    fn test_workers_survive_panics() {
        let pool = WorkerPool::new("survivor", 1).unwrap();
        pool.submit(|| panic!("first task dies")).unwrap();
        let out = pool.map(vec![5], |n: i32| n + 1).unwrap();
        assert_eq!(out, vec![6]);
        assert!(pool.close(ShutdownMode::Graceful).is_ok());
    }

    #[test]
    fn test_submit_after_close_fails_fast() {
        let pool = WorkerPool::new("closed", 2).unwrap();
        pool.close(ShutdownMode::Graceful).unwrap();

        assert!(pool.is_closed());
        assert!(matches!(pool.submit(|| {}), Err(ErrorKind::PoolClosed)));

        let err = pool.map(vec![1, 2], |n: i32| n).unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert!(err.failures.iter().all(|(_, e)| matches!(e, ErrorKind::PoolClosed)));
    }

    #[test]
    fn test_graceful_close_runs_queued_tasks() {
        let pool = WorkerPool::new("graceful", 1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.close(ShutdownMode::Graceful).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_abort_drops_queued_tasks() {
        struct Dropped(mpsc::Sender<()>);
        impl Drop for Dropped {
            fn drop(&mut self) {
                let _ = self.0.send(());
            }
        }

        let pool = WorkerPool::new("abort", 1).unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        pool.submit(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        })
        .unwrap();
        started_rx.recv().unwrap();

        let ran = Arc::new(AtomicUsize::new(0));
        let (dropped_tx, dropped_rx) = mpsc::channel();
        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            let guard = Dropped(dropped_tx.clone());
            pool.submit(move || {
                let _guard = guard;
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        drop(dropped_tx);

        let closer = {
            let pool = pool.clone();
            thread::spawn(move || pool.close(ShutdownMode::Abort))
        };
        // Give `close` time to flag the abort before the blocker finishes
        while !pool.is_closed() {
            thread::yield_now();
        }
        release_tx.send(()).unwrap();
        closer.join().unwrap().unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        // Every discarded task still ran its destructors
        assert_eq!(dropped_rx.iter().count(), 5);
    }

    #[test]
    fn test_abort_collects_every_worker_failure() {
        struct FailingCleanup(usize);
        impl Drop for FailingCleanup {
            fn drop(&mut self) {
                panic!("cleanup of task {} failed", self.0);
            }
        }

        let pool = WorkerPool::new("cleanup", 2).unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        for _ in 0..2 {
            let started_tx = started_tx.clone();
            let release_rx = release_rx.clone();
            pool.submit(move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
            })
            .unwrap();
        }
        started_rx.recv().unwrap();
        started_rx.recv().unwrap();

        // Discarded on abort; dropping each one kills the worker holding it
        for n in 0..2 {
            let cleanup = FailingCleanup(n);
            pool.submit(move || {
                let _cleanup = cleanup;
            })
            .unwrap();
        }

        let closer = {
            let pool = pool.clone();
            thread::spawn(move || pool.close(ShutdownMode::Abort))
        };
        while !pool.is_closed() {
            thread::yield_now();
        }
        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();

        let Err(ErrorKind::Join(failures)) = closer.join().unwrap() else {
            panic!("expected both workers to fail");
        };
        assert_eq!(failures.len(), 2);
        for n in 0..2 {
            let message = format!("cleanup of task {n} failed");
            assert!(failures.iter().any(|f| f.contains(&message)), "{failures:?}");
        }
        assert!(failures.iter().all(|f| f.starts_with("cleanup-")));
    }

    #[test]
    fn test_close_twice() {
        let pool = WorkerPool::new("twice", 2).unwrap();
        assert!(pool.close(ShutdownMode::Graceful).is_ok());
        assert!(pool.close(ShutdownMode::Abort).is_ok());
    }

    #[test]
    fn test_worker_names() {
        let pool = WorkerPool::new("named", 2).unwrap();
        let names = pool
            .map(vec![(); 4], |()| {
                thread::current().name().unwrap_or_default().to_string()
            })
            .unwrap();
        assert!(names.iter().all(|n| n.starts_with("named-")));
        assert_eq!(pool.name(), "named");
        assert_eq!(pool.size(), 2);
    }
}
