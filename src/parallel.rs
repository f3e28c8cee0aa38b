//! Data-parallel list operations on a [`WorkerPool`].
//!
//! Every function splits its input into at most `chunks` contiguous,
//! near-equal parts, processes each part as one task on the pool and
//! combines the partial results on the calling thread. Order is preserved
//! wherever the result has one.
//!
//! Like [`WorkerPool::map`], these block the caller and must not be called
//! from one of the pool's own workers.
//!
//! ```
//! use trawler::{WorkerPool, parallel};
//!
//! let pool = WorkerPool::new("numbers", 4).unwrap();
//! let squares = parallel::map(&pool, 3, (1..=6).collect(), |n: u64| n * n).unwrap();
//! assert_eq!(squares, vec![1, 4, 9, 16, 25, 36]);
//! assert_eq!(parallel::maximum(&pool, 3, squares, u64::cmp).unwrap(), Some(36));
//! ```
use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

use crate::{ErrorKind, Result, WorkerPool};

/// Split `values` into at most `chunks` contiguous parts whose sizes differ
/// by at most one. Empty input gives no parts.
///
/// # Errors
///
/// Fails if `chunks` is zero.
pub fn partition<T>(values: Vec<T>, chunks: usize) -> Result<Vec<Vec<T>>> {
    if chunks == 0 {
        return Err(ErrorKind::InvalidPoolSize("chunk count"));
    }
    let len = values.len();
    let count = chunks.min(len);
    if count == 0 {
        return Ok(Vec::new());
    }
    let (base, extra) = (len / count, len % count);

    let mut values = values.into_iter();
    Ok((0..count)
        .map(|index| {
            let size = base + usize::from(index < extra);
            values.by_ref().take(size).collect()
        })
        .collect())
}

/// Run `task` on every chunk and collect the partial results in order
fn run_chunked<T, R, F>(pool: &WorkerPool, chunks: usize, values: Vec<T>, task: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<T>) -> R + Send + Sync + 'static,
{
    let parts = partition(values, chunks)?;
    Ok(pool.map(parts, task)?)
}

/// Apply `f` to every value
///
/// # Errors
///
/// Fails if `chunks` is zero, or with [`ErrorKind::TasksFailed`] if a chunk
/// panicked or the pool is closed.
pub fn map<T, U, F>(pool: &WorkerPool, chunks: usize, values: Vec<T>, f: F) -> Result<Vec<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let parts = run_chunked(pool, chunks, values, move |chunk| {
        chunk.into_iter().map(&f).collect::<Vec<U>>()
    })?;
    Ok(parts.into_iter().flatten().collect())
}

/// Keep the values for which `predicate` holds
///
/// # Errors
///
/// See [`map`].
pub fn filter<T, P>(pool: &WorkerPool, chunks: usize, values: Vec<T>, predicate: P) -> Result<Vec<T>>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let parts = run_chunked(pool, chunks, values, move |chunk| {
        chunk.into_iter().filter(|v| predicate(v)).collect::<Vec<T>>()
    })?;
    Ok(parts.into_iter().flatten().collect())
}

/// Smallest value according to `compare`, `None` for empty input. The
/// first of several equal minima wins.
///
/// # Errors
///
/// See [`map`].
pub fn minimum<T, C>(pool: &WorkerPool, chunks: usize, values: Vec<T>, compare: C) -> Result<Option<T>>
where
    T: Send + 'static,
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    let compare = Arc::new(compare);
    let per_chunk = Arc::clone(&compare);
    let parts = run_chunked(pool, chunks, values, move |chunk| {
        chunk.into_iter().min_by(|a, b| per_chunk(a, b))
    })?;
    Ok(parts.into_iter().flatten().min_by(|a, b| compare(a, b)))
}

/// Largest value according to `compare`, `None` for empty input. The last
/// of several equal maxima wins.
///
/// # Errors
///
/// See [`map`].
pub fn maximum<T, C>(pool: &WorkerPool, chunks: usize, values: Vec<T>, compare: C) -> Result<Option<T>>
where
    T: Send + 'static,
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    let compare = Arc::new(compare);
    let per_chunk = Arc::clone(&compare);
    let parts = run_chunked(pool, chunks, values, move |chunk| {
        chunk.into_iter().max_by(|a, b| per_chunk(a, b))
    })?;
    Ok(parts.into_iter().flatten().max_by(|a, b| compare(a, b)))
}

/// Whether `predicate` holds for every value. `true` for empty input.
///
/// # Errors
///
/// See [`map`].
pub fn all<T, P>(pool: &WorkerPool, chunks: usize, values: Vec<T>, predicate: P) -> Result<bool>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let parts = run_chunked(pool, chunks, values, move |chunk| {
        chunk.iter().all(|v| predicate(v))
    })?;
    Ok(parts.into_iter().all(|holds| holds))
}

/// Whether `predicate` holds for at least one value. `false` for empty
/// input.
///
/// # Errors
///
/// See [`map`].
pub fn any<T, P>(pool: &WorkerPool, chunks: usize, values: Vec<T>, predicate: P) -> Result<bool>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let parts = run_chunked(pool, chunks, values, move |chunk| {
        chunk.iter().any(|v| predicate(v))
    })?;
    Ok(parts.into_iter().any(|holds| holds))
}

/// Concatenate the string forms of all values, without separator
///
/// # Errors
///
/// See [`map`].
pub fn join<T>(pool: &WorkerPool, chunks: usize, values: Vec<T>) -> Result<String>
where
    T: Display + Send + 'static,
{
    let parts = run_chunked(pool, chunks, values, |chunk| {
        chunk.iter().map(ToString::to_string).collect::<String>()
    })?;
    Ok(parts.concat())
}
