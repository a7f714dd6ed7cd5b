//! A tool-invocation workflow engine: a versioned tool registry, an
//! idempotency-aware retry engine, a restricted condition grammar, branch
//! and parallel-group routing, a bounded worker pool, and the manager that
//! drives a workflow definition through all of them (spec §4).

pub mod branch;
pub mod clock;
pub mod condition;
pub mod diagnostics;
pub mod parallel;
pub mod pool;
pub mod registry;
pub mod retry;
pub mod workflow;

pub use branch::{resolve_branch, BranchDefinition, SwitchCase};
pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::{
    evaluate_condition, evaluate_value, ConditionClosure, ConditionError, ConditionExpr,
    EvalValue, MatchOutcome, ResultsView, ValueClosure, ValueExpr, ValueOutcome,
};
pub use diagnostics::{DiagnosticEvent, EventSink, NoopSink, TracingEventSink};
pub use parallel::{ParallelError, ParallelExecutionManager, ParallelExecutionResult, ParallelGroup, StepExecutor, StepList};
pub use pool::{PoolError, PoolStats, PoolStatsSnapshot, PoolTask, StrategyOutcome, WaitStrategy, WorkerPool};
pub use registry::{
    RegisterOutcome, RegistryError, RegistrySnapshot, RiskLevel, SchemaCache, SchemaError,
    SecurityDescriptor, ToolDependency, ToolHandler, ToolMetadata, ToolRegistry,
};
pub use retry::{retry_with_policy, run_fallback_chain, ErrorClass, FallbackExhausted, PolicyTable, RetryError, RetryPolicy};
pub use workflow::{
    parse_definition, validate_definition, ContextError, ContextSnapshot, DependencyGraph,
    ErrorPolicy, InputSpec, PoolConfig, StepBody, ToolInvocation, ValidationIssue,
    WorkflowContext, WorkflowDefinition, WorkflowError, WorkflowManager, WorkflowRunOutcome,
    WorkflowStep, YamlError, MAX_DEPTH,
};
