//! Parallel Execution Manager (C6): run a parallel group as a single
//! logical operation over the Worker Pool (spec §4.6).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::condition::{evaluate_value, EvalValue, ResultsView};
use crate::diagnostics::{DiagnosticEvent, EventSink};
use crate::pool::{PoolTask, WaitStrategy, WorkerPool};

use super::group::{ParallelGroup, StepList};
use super::result::ParallelExecutionResult;

/// Re-enters the per-step lifecycle for one group member (supplied by C7).
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute_step(&self, step_id: &str) -> Result<serde_json::Value, serde_json::Value>;
}

#[derive(Debug, Error)]
pub enum ParallelError {
    #[error("parallel group '{group_id}' did not succeed under its wait strategy")]
    ExecutionFailed {
        group_id: String,
        result: ParallelExecutionResult,
    },
    #[error("computed step list for group '{group_id}' failed: {message}")]
    ComputedStepListFailed { group_id: String, message: String },
}

pub struct ParallelExecutionManager {
    clock: Arc<dyn Clock>,
}

impl ParallelExecutionManager {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub async fn execute_group(
        &self,
        group: &ParallelGroup,
        executor: Arc<dyn StepExecutor>,
        ctx: &dyn ResultsView,
        sink: &dyn EventSink,
    ) -> Result<ParallelExecutionResult, ParallelError> {
        let member_ids = self.resolve_steps(group, ctx)?;
        let start = Instant::now();
        sink.emit(DiagnosticEvent::GroupStarted {
            group_id: group.group_id.clone(),
            member_count: member_ids.len(),
        });

        if member_ids.is_empty() {
            let result = ParallelExecutionResult {
                group_id: group.group_id.clone(),
                completed_steps: Vec::new(),
                failed_steps: Vec::new(),
                skipped_steps: Vec::new(),
                duration: start.elapsed(),
                success: true,
                results: HashMap::new(),
                errors: HashMap::new(),
            };
            sink.emit(DiagnosticEvent::GroupCompleted {
                group_id: group.group_id.clone(),
                success: true,
            });
            return Ok(result);
        }

        let max_concurrent = group
            .max_concurrent
            .filter(|&m| m < member_ids.len())
            .unwrap_or(member_ids.len())
            .max(1);
        let pool: Arc<WorkerPool<serde_json::Value>> =
            Arc::new(WorkerPool::new(max_concurrent, Arc::clone(&self.clock)));

        let mut pending: futures::stream::FuturesUnordered<_> = member_ids
            .iter()
            .map(|id| {
                let id = id.clone();
                let executor = Arc::clone(&executor);
                let pool = Arc::clone(&pool);
                tokio::spawn(async move {
                    let id_for_call = id.clone();
                    let task = PoolTask::new(id.clone(), async move {
                        executor
                            .execute_step(&id_for_call)
                            .await
                            .map_err(|e| e.to_string())
                    });
                    (id, pool.execute_one(task).await)
                })
            })
            .collect();

        let deadline = async {
            if let Some(d) = group.timeout {
                self.clock.sleep(d).await;
            } else {
                futures::future::pending::<()>().await;
            }
        };
        tokio::pin!(deadline);

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut results = HashMap::new();
        let mut errors = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut timed_out = false;
        let mut decided = false;

        loop {
            if decided || seen.len() == member_ids.len() {
                break;
            }
            tokio::select! {
                biased;
                () = &mut deadline => {
                    timed_out = true;
                    break;
                }
                item = pending.next(), if !pending.is_empty() => {
                    match item {
                        None => break,
                        Some(Ok((id, Ok(value)))) => {
                            seen.insert(id.clone());
                            completed.push(id.clone());
                            results.insert(id, value);
                            if matches!(group.strategy, WaitStrategy::Any | WaitStrategy::Race) {
                                decided = true;
                            }
                        }
                        Some(Ok((id, Err(e)))) => {
                            seen.insert(id.clone());
                            failed.push(id.clone());
                            errors.insert(id, serde_json::json!({ "message": e.to_string() }));
                            if matches!(group.strategy, WaitStrategy::All | WaitStrategy::Race) {
                                decided = true;
                            }
                        }
                        Some(Err(join_err)) => {
                            debug!(error = %join_err, "parallel group member task panicked");
                        }
                    }
                }
            }
        }

        let never_seen: Vec<String> = member_ids
            .iter()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();

        let all_settled_timeout = timed_out && matches!(group.strategy, WaitStrategy::AllSettled);
        let skipped_steps = if all_settled_timeout {
            for id in &never_seen {
                errors.insert(
                    id.clone(),
                    serde_json::json!({ "kind": "GroupDeadlineExceeded" }),
                );
            }
            Vec::new()
        } else {
            never_seen.clone()
        };
        let failed_steps = if all_settled_timeout {
            let mut f = failed.clone();
            f.extend(never_seen);
            f
        } else {
            failed.clone()
        };

        let success = if timed_out {
            matches!(group.strategy, WaitStrategy::AllSettled)
        } else {
            match group.strategy {
                WaitStrategy::All => failed.is_empty(),
                WaitStrategy::Any => !completed.is_empty(),
                WaitStrategy::AllSettled => true,
                WaitStrategy::Race => !completed.is_empty(),
            }
        };

        let result = ParallelExecutionResult {
            group_id: group.group_id.clone(),
            completed_steps: completed,
            failed_steps,
            skipped_steps,
            duration: start.elapsed(),
            success,
            results,
            errors,
        };

        sink.emit(DiagnosticEvent::GroupCompleted {
            group_id: group.group_id.clone(),
            success,
        });

        if !group.continue_on_error && !success {
            return Err(ParallelError::ExecutionFailed {
                group_id: group.group_id.clone(),
                result,
            });
        }
        Ok(result)
    }

    fn resolve_steps(
        &self,
        group: &ParallelGroup,
        ctx: &dyn ResultsView,
    ) -> Result<Vec<String>, ParallelError> {
        match &group.steps {
            StepList::Literal(ids) => Ok(ids.clone()),
            StepList::Computed(expr) => {
                let outcome = evaluate_value(expr, ctx);
                if let Some(err) = outcome.error {
                    return Err(ParallelError::ComputedStepListFailed {
                        group_id: group.group_id.clone(),
                        message: err.to_string(),
                    });
                }
                let value = match outcome.value {
                    EvalValue::Json(v) => v,
                    EvalValue::Undefined => serde_json::Value::Null,
                };
                let ids = value
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(ids)
            }
        }
    }
}
