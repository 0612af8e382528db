//! Gather with partial failure.
//!
//! Runs a batch of futures concurrently on the current task, waits for all
//! of them to settle, keeps the successes in input order and counts the
//! failures instead of propagating them.

use std::fmt::Display;
use std::future::Future;

use futures_util::future::join_all;

/// Settled results of a [`gather`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Gathered<T> {
    pub successes: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for Gathered<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            dropped: 0,
        }
    }
}

pub async fn gather<I, F, T, E>(futures: I) -> Gathered<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let results = join_all(futures).await;
    let mut gathered = Gathered {
        successes: Vec::with_capacity(results.len()),
        dropped: 0,
    };

    for result in results {
        match result {
            Ok(value) => gathered.successes.push(value),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping failed result");
                gathered.dropped += 1;
            }
        }
    }

    gathered
}
