//! Worker Pool (C5): bounded-concurrency task execution with per-task
//! timeouts and the four wait strategies (spec §4.5).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::clock::Clock;

use super::stats::{PoolStats, PoolStatsSnapshot};
use super::strategy::{StrategyOutcome, WaitStrategy};
use super::task::PoolTask;

#[derive(Debug, Error, Clone)]
pub enum PoolError {
    #[error("operation timed out")]
    OperationTimedOut,
    #[error("task failed: {0}")]
    Failed(String),
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Bounds concurrent task execution to `maxConcurrent`, queueing the rest.
pub struct WorkerPool<T> {
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
    default_timeout: Option<Duration>,
    clock: Arc<dyn Clock>,
    stats: Arc<PoolStats>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// # Panics
    /// Panics if `max_concurrent` is zero.
    #[must_use]
    pub fn new(max_concurrent: usize, clock: Arc<dyn Clock>) -> Self {
        assert!(max_concurrent > 0, "max_concurrent must be at least 1");
        Self {
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            default_timeout: None,
            clock,
            stats: Arc::new(PoolStats::default()),
            _marker: std::marker::PhantomData,
        }
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    #[must_use]
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot(self.max_concurrent)
    }

    fn effective_timeout(&self, task_timeout: Option<Duration>) -> Option<Duration> {
        match (task_timeout, self.default_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    fn spawn_task(&self, task: PoolTask<T>) -> JoinHandle<(String, Result<T, PoolError>)> {
        let id = task.id.clone();
        let timeout = self.effective_timeout(task.timeout);
        let semaphore = Arc::clone(&self.semaphore);
        let clock = Arc::clone(&self.clock);
        let stats = Arc::clone(&self.stats);
        let future = task.future;
        stats.record_enqueued();
        let enqueued_at = Instant::now();
        tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    stats.record_dequeued(enqueued_at.elapsed());
                    stats.record_failed();
                    return (id, Err(PoolError::Failed("pool is shut down".to_string())));
                }
            };
            stats.record_dequeued(enqueued_at.elapsed());
            let outcome = match timeout {
                Some(d) => {
                    tokio::select! {
                        res = future => res.map_err(PoolError::Failed),
                        () = clock.sleep(d) => Err(PoolError::OperationTimedOut),
                    }
                }
                None => future.await.map_err(PoolError::Failed),
            };
            drop(permit);
            match &outcome {
                Ok(_) => stats.record_completed(),
                Err(PoolError::OperationTimedOut) => stats.record_timed_out(),
                Err(_) => stats.record_failed(),
            }
            (id, outcome)
        })
    }

    /// Run a single task to completion.
    pub async fn execute_one(&self, task: PoolTask<T>) -> Result<T, PoolError> {
        let handle = self.spawn_task(task);
        match handle.await {
            Ok((_, outcome)) => outcome,
            Err(e) => Err(PoolError::Panicked(e.to_string())),
        }
    }

    /// Wait for all tasks, failing on the first error encountered (in
    /// submission order).
    pub async fn execute_many(&self, tasks: Vec<PoolTask<T>>) -> Result<Vec<T>, PoolError> {
        let handles: Vec<_> = tasks.into_iter().map(|t| self.spawn_task(t)).collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok((_, Ok(v))) => results.push(v),
                Ok((_, Err(e))) => return Err(e),
                Err(e) => return Err(PoolError::Panicked(e.to_string())),
            }
        }
        Ok(results)
    }

    /// Run a batch of tasks under one of the four wait strategies.
    pub async fn execute_with_strategy(
        &self,
        tasks: Vec<PoolTask<T>>,
        strategy: WaitStrategy,
    ) -> StrategyOutcome<T> {
        if tasks.is_empty() {
            return StrategyOutcome {
                success: !matches!(strategy, WaitStrategy::All),
                results: Vec::new(),
                errors: Vec::new(),
                skipped: Vec::new(),
            };
        }

        let all_ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let mut pending: FuturesUnordered<_> =
            tasks.into_iter().map(|t| self.spawn_task(t)).collect();

        let mut results = Vec::new();
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        match strategy {
            WaitStrategy::All => {
                let mut success = true;
                while let Some(outcome) = pending.next().await {
                    match outcome {
                        Ok((id, Ok(v))) => {
                            seen.insert(id.clone());
                            results.push((id, v));
                        }
                        Ok((id, Err(e))) => {
                            seen.insert(id.clone());
                            errors.push((id, e));
                            success = false;
                            break;
                        }
                        Err(e) => {
                            errors.push(("<join>".to_string(), PoolError::Panicked(e.to_string())));
                            success = false;
                            break;
                        }
                    }
                }
                StrategyOutcome {
                    success,
                    results,
                    errors,
                    skipped: skipped_ids(&all_ids, &seen),
                }
            }
            WaitStrategy::Any => {
                let mut success = false;
                while let Some(outcome) = pending.next().await {
                    match outcome {
                        Ok((id, Ok(v))) => {
                            seen.insert(id.clone());
                            results.push((id, v));
                            success = true;
                            break;
                        }
                        Ok((id, Err(e))) => {
                            seen.insert(id.clone());
                            errors.push((id, e));
                        }
                        Err(e) => {
                            errors.push(("<join>".to_string(), PoolError::Panicked(e.to_string())));
                        }
                    }
                }
                StrategyOutcome {
                    success,
                    results,
                    errors,
                    skipped: skipped_ids(&all_ids, &seen),
                }
            }
            WaitStrategy::AllSettled => {
                while let Some(outcome) = pending.next().await {
                    match outcome {
                        Ok((id, Ok(v))) => {
                            seen.insert(id.clone());
                            results.push((id, v));
                        }
                        Ok((id, Err(e))) => {
                            seen.insert(id.clone());
                            errors.push((id, e));
                        }
                        Err(e) => {
                            errors.push(("<join>".to_string(), PoolError::Panicked(e.to_string())));
                        }
                    }
                }
                StrategyOutcome {
                    success: true,
                    results,
                    errors,
                    skipped: skipped_ids(&all_ids, &seen),
                }
            }
            WaitStrategy::Race => {
                let success = match pending.next().await {
                    Some(Ok((id, Ok(v)))) => {
                        seen.insert(id.clone());
                        results.push((id, v));
                        true
                    }
                    Some(Ok((id, Err(e)))) => {
                        seen.insert(id.clone());
                        errors.push((id, e));
                        false
                    }
                    Some(Err(e)) => {
                        errors.push(("<join>".to_string(), PoolError::Panicked(e.to_string())));
                        false
                    }
                    None => false,
                };
                StrategyOutcome {
                    success,
                    results,
                    errors,
                    skipped: skipped_ids(&all_ids, &seen),
                }
            }
        }
    }
}

fn skipped_ids(all: &[String], seen: &HashSet<String>) -> Vec<String> {
    all.iter().filter(|id| !seen.contains(*id)).cloned().collect()
}
