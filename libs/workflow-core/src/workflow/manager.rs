//! Workflow Manager (C7): validate, graph-build, drive, and return (spec
//! §4.7). Integrates C1 (Tool Registry) via C2 (Retry Engine), C4 (Branch
//! Resolver) via C3, and C6 (Parallel Execution Manager) via C5.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::{json, Value};

use crate::branch::resolve_branch;
use crate::clock::Clock;
use crate::condition::{evaluate_condition, evaluate_value, EvalValue};
use crate::diagnostics::{DiagnosticEvent, EventSink};
use crate::parallel::{ParallelError, ParallelExecutionManager, StepExecutor};
use crate::registry::{RegistryError, ToolRegistry};
use crate::retry::{retry_with_policy, ErrorClass, PolicyTable};

use super::context::WorkflowContext;
use super::definition::WorkflowDefinition;
use super::step::{ErrorPolicy, StepBody, ToolInvocation};
use super::validate::validate_definition;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    #[error("invalid workflow definition: {0:?}")]
    InvalidDefinition(Vec<String>),
    #[error("step '{step_id}' failed: {message}")]
    StepFailed { step_id: String, message: String },
    #[error("workflow deadline exceeded")]
    WorkflowDeadlineExceeded,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Summary of one run (spec §3's per-run bookkeeping, surfaced back to the
/// caller once [`WorkflowManager::run`] returns).
#[derive(Debug, Clone)]
pub struct WorkflowRunOutcome {
    pub run_id: String,
    pub success: bool,
    pub completed_steps: Vec<String>,
    pub failed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
}

#[derive(Debug, Clone)]
enum TerminationReason {
    Deadline,
    StepFailure { step_id: String, error: Value },
}

/// Outcome of one step's dispatch, cached per run so a step is visited at
/// most once (spec §8 "visits each step at most once per run").
#[derive(Debug, Clone)]
enum StepOutcome {
    Success(Value),
    Error(Value),
    Skipped,
    Terminated,
}

fn classify_registry_error(error: &RegistryError) -> ErrorClass {
    match error {
        RegistryError::HandlerFailed(_, _) => ErrorClass::Transient,
        RegistryError::ToolNotFound(_)
        | RegistryError::ToolDisabled(_)
        | RegistryError::InvalidInput(_)
        | RegistryError::InvalidOutput(_) => ErrorClass::Permanent,
    }
}

/// Owns the lifecycle of a workflow run.
pub struct WorkflowManager {
    registry: Arc<ToolRegistry>,
    parallel: Arc<ParallelExecutionManager>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    policies: Arc<PolicyTable>,
}

impl WorkflowManager {
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        let parallel = Arc::new(ParallelExecutionManager::new(Arc::clone(&clock)));
        Self {
            registry,
            parallel,
            clock,
            sink,
            policies: Arc::new(PolicyTable::new()),
        }
    }

    #[must_use]
    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = Arc::new(policies);
        self
    }

    /// Validate, build the dependency graph implicitly through recursive
    /// dependency resolution, and drive every step to completion (spec
    /// §4.7). `ctx` stays readable by the caller after this returns,
    /// success or not.
    pub async fn run(
        self: &Arc<Self>,
        definition: WorkflowDefinition,
        ctx: Arc<WorkflowContext>,
    ) -> Result<WorkflowRunOutcome, WorkflowError> {
        validate_definition(&definition)
            .map_err(|issues| WorkflowError::InvalidDefinition(issues.iter().map(ToString::to_string).collect()))?;

        let run_id = ctx.run_id.clone();
        self.sink.emit(DiagnosticEvent::WorkflowStarted {
            run_id: run_id.clone(),
            name: definition.name.clone(),
        });

        let referenced: HashSet<String> = definition
            .steps
            .iter()
            .flat_map(super::step::WorkflowStep::referenced_step_ids)
            .collect();
        let roots: Vec<String> = definition
            .steps
            .iter()
            .map(|s| s.id.clone())
            .filter(|id| !referenced.contains(id))
            .collect();
        let all_ids: Vec<String> = definition.steps.iter().map(|s| s.id.clone()).collect();

        let run = Arc::new(Run {
            manager: Arc::clone(self),
            definition: Arc::new(definition),
            ctx,
            memo: Mutex::new(HashMap::new()),
            termination: Mutex::new(None),
        });

        futures::future::join_all(roots.iter().cloned().map(|id| run.ensure(id))).await;

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut skipped = Vec::new();
        for id in &all_ids {
            if run.ctx.has_result(id) {
                completed.push(id.clone());
            } else if run.ctx.has_error(id) {
                failed.push(id.clone());
            } else {
                skipped.push(id.clone());
            }
        }

        let termination = run.termination.lock().unwrap().clone();
        self.sink.emit(DiagnosticEvent::WorkflowCompleted {
            run_id: run_id.clone(),
            success: termination.is_none() && failed.is_empty(),
        });

        match termination {
            Some(TerminationReason::Deadline) => {
                self.sink.emit(DiagnosticEvent::WorkflowDeadlineExceeded { run_id });
                Err(WorkflowError::WorkflowDeadlineExceeded)
            }
            Some(TerminationReason::StepFailure { step_id, error }) => Err(WorkflowError::StepFailed {
                step_id,
                message: error.to_string(),
            }),
            None => Ok(WorkflowRunOutcome {
                run_id,
                success: failed.is_empty(),
                completed_steps: completed,
                failed_steps: failed,
                skipped_steps: skipped,
            }),
        }
    }
}

/// Per-run scratch state: the memoization table that makes the recursive
/// `ensure` walk double as the dependency-graph driver without a separate
/// scheduler loop — a step's `dependsOn` list is just the set of other
/// steps `ensure`d (and awaited) before it dispatches.
struct Run {
    manager: Arc<WorkflowManager>,
    definition: Arc<WorkflowDefinition>,
    ctx: Arc<WorkflowContext>,
    memo: Mutex<HashMap<String, Shared<BoxFuture<'static, StepOutcome>>>>,
    termination: Mutex<Option<TerminationReason>>,
}

impl Run {
    fn sink(&self) -> &dyn EventSink {
        self.manager.sink.as_ref()
    }

    fn is_terminated(&self) -> bool {
        self.termination.lock().unwrap().is_some()
    }

    fn try_terminate(&self, reason: TerminationReason) {
        let mut guard = self.termination.lock().unwrap();
        if guard.is_none() {
            *guard = Some(reason);
        }
    }

    fn deadline_exceeded(&self) -> bool {
        self.ctx.deadline_exceeded(self.manager.clock.now())
    }

    /// Ensure `step_id` has been dispatched exactly once for this run,
    /// returning a cheap clone of its (shared, memoized) outcome future.
    fn ensure(self: &Arc<Self>, step_id: String) -> Shared<BoxFuture<'static, StepOutcome>> {
        let mut memo = self.memo.lock().unwrap();
        if let Some(existing) = memo.get(&step_id) {
            return existing.clone();
        }
        let run = Arc::clone(self);
        let key = step_id.clone();
        let future: BoxFuture<'static, StepOutcome> = Box::pin(async move { run.dispatch(step_id).await });
        let shared = future.shared();
        memo.insert(key, shared.clone());
        shared
    }

    async fn dispatch(self: Arc<Self>, step_id: String) -> StepOutcome {
        if self.is_terminated() {
            return StepOutcome::Terminated;
        }
        if self.deadline_exceeded() {
            self.try_terminate(TerminationReason::Deadline);
            return StepOutcome::Terminated;
        }

        let Some(step) = self.definition.step(&step_id).cloned() else {
            return StepOutcome::Error(json!({ "kind": "InvalidDefinition", "message": format!("unknown step '{step_id}'") }));
        };

        // 1. Dependency wait.
        let deps = step.depends_on.clone();
        futures::future::join_all(deps.iter().cloned().map(|d| self.ensure(d))).await;

        if self.is_terminated() {
            return StepOutcome::Terminated;
        }
        if self.deadline_exceeded() {
            self.try_terminate(TerminationReason::Deadline);
            return StepOutcome::Terminated;
        }

        // 2. Condition.
        if let Some(condition) = &step.condition {
            let snapshot = self.ctx.snapshot();
            let outcome = evaluate_condition(condition, &snapshot);
            if !outcome.matched {
                self.ctx.mark_skipped(&step_id);
                self.sink().emit(DiagnosticEvent::StepSkipped {
                    step_id: step_id.clone(),
                });
                return StepOutcome::Skipped;
            }
        }

        self.sink().emit(DiagnosticEvent::StepStarted {
            step_id: step_id.clone(),
        });

        // 3 & 4. Dispatch and record, per step kind.
        match &step.body {
            StepBody::Tool(invocation) => {
                let result = self.run_tool(invocation).await;
                self.record(&step_id, result, step.on_error)
            }
            StepBody::Branch(branch) => {
                let snapshot = self.ctx.snapshot();
                let targets = resolve_branch(branch, &snapshot);
                futures::future::join_all(targets.into_iter().map(|id| self.ensure(id))).await;
                // A branch is a structural directive, not a work unit: it
                // never occupies a `results`/`errors` slot of its own.
                StepOutcome::Success(Value::Null)
            }
            StepBody::Parallel(group) => {
                let result = self.run_parallel(group).await;
                self.record(&step_id, result, step.on_error)
            }
        }
    }

    fn record(&self, step_id: &str, result: Result<Value, Value>, policy: ErrorPolicy) -> StepOutcome {
        match result {
            Ok(value) => {
                let _ = self.ctx.write_result(step_id, value.clone());
                self.sink().emit(DiagnosticEvent::StepSucceeded {
                    step_id: step_id.to_string(),
                });
                StepOutcome::Success(value)
            }
            Err(error) => {
                let _ = self.ctx.write_error(step_id, error.clone());
                self.sink().emit(DiagnosticEvent::StepFailed {
                    step_id: step_id.to_string(),
                    error: error.to_string(),
                });
                match policy {
                    ErrorPolicy::Continue => StepOutcome::Error(error),
                    // `retry` already routed through the Retry Engine inside
                    // `run_tool`; reaching here means it exhausted, so it
                    // falls through to `fail` (spec §4.7 step 4).
                    ErrorPolicy::Fail | ErrorPolicy::Retry => {
                        self.try_terminate(TerminationReason::StepFailure {
                            step_id: step_id.to_string(),
                            error: error.clone(),
                        });
                        StepOutcome::Error(error)
                    }
                }
            }
        }
    }

    async fn run_tool(&self, invocation: &ToolInvocation) -> Result<Value, Value> {
        let snapshot = self.ctx.snapshot();
        let input = match &invocation.input {
            super::step::InputSpec::Literal(v) => v.clone(),
            super::step::InputSpec::Computed(expr) => {
                let outcome = evaluate_value(expr, &snapshot);
                if let Some(err) = outcome.error {
                    return Err(json!({ "kind": "ConditionEvaluation", "message": err.to_string() }));
                }
                match outcome.value {
                    EvalValue::Json(v) => v,
                    EvalValue::Undefined => Value::Null,
                }
            }
        };

        let idempotent_hint = self
            .manager
            .registry
            .get(&invocation.tool, invocation.version.as_deref())
            .await
            .map(|h| h.metadata().security.idempotent);
        let policy = self.manager.policies.resolve(&invocation.tool, idempotent_hint);

        let registry = Arc::clone(&self.manager.registry);
        let tool_name = invocation.tool.clone();
        let version = invocation.version.clone();

        let outcome = retry_with_policy(
            &invocation.tool,
            &policy,
            self.manager.clock.as_ref(),
            self.sink(),
            |e: &RegistryError| classify_registry_error(e),
            move |_attempt| {
                let registry = Arc::clone(&registry);
                let input = input.clone();
                let snapshot = snapshot.clone();
                let tool_name = tool_name.clone();
                let version = version.clone();
                async move {
                    registry
                        .execute(&tool_name, input, &snapshot, version.as_deref())
                        .await
                }
            },
        )
        .await;

        outcome.map_err(|e| json!({ "kind": "RetryExhausted", "message": e.into_inner().to_string() }))
    }

    async fn run_parallel(self: &Arc<Self>, group: &crate::parallel::ParallelGroup) -> Result<Value, Value> {
        let snapshot = self.ctx.snapshot();
        let callback: Arc<dyn StepExecutor> = Arc::new(GroupCallback { run: Arc::clone(self) });
        match self
            .manager
            .parallel
            .execute_group(group, callback, &snapshot, self.sink())
            .await
        {
            Ok(result) => Ok(json!({
                "groupId": result.group_id,
                "success": result.success,
                "completedSteps": result.completed_steps,
                "failedSteps": result.failed_steps,
                "skippedSteps": result.skipped_steps,
            })),
            Err(ParallelError::ExecutionFailed { group_id, result }) => Err(json!({
                "kind": "GroupExecutionFailed",
                "groupId": group_id,
                "completedSteps": result.completed_steps,
                "failedSteps": result.failed_steps,
                "skippedSteps": result.skipped_steps,
            })),
            Err(ParallelError::ComputedStepListFailed { group_id, message }) => Err(json!({
                "kind": "ComputedStepListFailed",
                "groupId": group_id,
                "message": message,
            })),
        }
    }
}

/// Hands group members back into the per-step lifecycle (spec §4.7 "call C6
/// with a step-executor callback that reenters the per-step lifecycle").
struct GroupCallback {
    run: Arc<Run>,
}

#[async_trait]
impl StepExecutor for GroupCallback {
    async fn execute_step(&self, step_id: &str) -> Result<Value, Value> {
        match self.run.ensure(step_id.to_string()).await {
            StepOutcome::Success(v) => Ok(v),
            StepOutcome::Error(e) => Err(e),
            StepOutcome::Skipped => Ok(Value::Null),
            StepOutcome::Terminated => Err(json!({ "kind": "WorkflowDeadlineExceeded" })),
        }
    }
}
