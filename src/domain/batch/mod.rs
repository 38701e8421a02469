//! Concurrent fan-out / fan-in of independent per-item operations
//!
//! Every item runs to completion; a failing item never cancels its siblings.
//! Results are reported per item, in input order, so callers decide whether a
//! failure is isolated or aborts the enclosing pipeline.

use std::future::Future;

use futures::future::join_all;

use crate::domain::DomainError;

/// Result of one item in a batch
#[derive(Debug)]
pub struct ItemOutcome<K, T> {
    pub key: K,
    pub result: Result<T, DomainError>,
}

impl<K, T> ItemOutcome<K, T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item results of a completed batch
#[derive(Debug)]
pub struct BatchReport<K, T> {
    outcomes: Vec<ItemOutcome<K, T>>,
}

impl<K, T> BatchReport<K, T> {
    pub fn new(outcomes: Vec<ItemOutcome<K, T>>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[ItemOutcome<K, T>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn into_outcomes(self) -> Vec<ItemOutcome<K, T>> {
        self.outcomes
    }

    /// Split into successes and failures, each in input order
    pub fn into_parts(self) -> (Vec<(K, T)>, Vec<(K, DomainError)>) {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for outcome in self.outcomes {
            match outcome.result {
                Ok(value) => succeeded.push((outcome.key, value)),
                Err(error) => failed.push((outcome.key, error)),
            }
        }

        (succeeded, failed)
    }

    /// All-or-nothing view: the first failure in input order, if any
    pub fn into_result(self) -> Result<Vec<(K, T)>, DomainError> {
        let (succeeded, failed) = self.into_parts();

        match failed.into_iter().next() {
            Some((_, error)) => Err(error),
            None => Ok(succeeded),
        }
    }
}

/// Run `operation` for every item concurrently and wait for all of them
pub async fn fan_out<I, K, T, F, Fut>(items: I, operation: F) -> BatchReport<K, T>
where
    I: IntoIterator<Item = K>,
    K: Clone,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let pending = items.into_iter().map(|key| {
        let future = operation(key.clone());
        async move {
            ItemOutcome {
                key,
                result: future.await,
            }
        }
    });

    BatchReport::new(join_all(pending).await)
}
