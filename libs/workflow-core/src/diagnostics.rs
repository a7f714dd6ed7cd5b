//! Structured diagnostic events emitted by every component.
//!
//! The core never formats or transports these itself (spec §6.3) — it hands
//! each [`DiagnosticEvent`] to an injected [`EventSink`]. [`TracingEventSink`]
//! routes them through `tracing`; [`NoopSink`] drops them.

use serde_json::Value;

/// One lifecycle event from any component.
#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    /// A tool was registered, possibly replacing an existing version.
    ToolRegistered {
        name: String,
        version: String,
        replaced: bool,
    },
    /// A registration or call touched a deprecated tool version.
    DeprecationWarning {
        name: String,
        version: String,
        message: Option<String>,
    },
    /// A dependency declared by a tool could not be satisfied.
    DependencyWarning { name: String, dependency: String },
    /// A workflow step was dispatched.
    StepStarted { step_id: String },
    /// A workflow step produced a result.
    StepSucceeded { step_id: String },
    /// A workflow step's condition evaluated false; it was skipped.
    StepSkipped { step_id: String },
    /// A workflow step recorded an error (policy may still let siblings run).
    StepFailed { step_id: String, error: String },
    /// A retry attempt is about to sleep before trying again.
    RetryAttempt {
        tool: String,
        attempt: u32,
        delay_ms: u64,
    },
    /// All retry attempts for a tool were exhausted.
    RetryExhausted { tool: String, attempts: u32 },
    /// A fallback chain moved to its next strategy.
    FallbackAttempt { strategy: String },
    /// A parallel group started.
    GroupStarted { group_id: String, member_count: usize },
    /// A parallel group finished, successfully or not.
    GroupCompleted { group_id: String, success: bool },
    /// The run-level deadline fired.
    WorkflowDeadlineExceeded { run_id: String },
    /// A workflow run started.
    WorkflowStarted { run_id: String, name: String },
    /// A workflow run completed.
    WorkflowCompleted { run_id: String, success: bool },
    /// Freeform structured payload for extensions.
    Custom { kind: String, payload: Value },
}

/// Receiver for [`DiagnosticEvent`]s. Implement this to route events to your
/// own transport (spec's "Diagnostic sink" collaborator, §6.3).
pub trait EventSink: Send + Sync {
    /// Handle one event. Must not block the caller for long; implementations
    /// that need to do I/O should buffer/queue internally.
    fn emit(&self, event: DiagnosticEvent);
}

/// Default sink: routes every event through `tracing` at an appropriate
/// level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::ToolRegistered {
                name,
                version,
                replaced,
            } => {
                tracing::info!(tool = %name, version = %version, replaced, "tool registered");
            }
            DiagnosticEvent::DeprecationWarning {
                name,
                version,
                message,
            } => {
                tracing::warn!(tool = %name, version = %version, message = ?message, "deprecated tool used");
            }
            DiagnosticEvent::DependencyWarning { name, dependency } => {
                tracing::warn!(tool = %name, dependency = %dependency, "dependency unsatisfied");
            }
            DiagnosticEvent::StepStarted { step_id } => {
                tracing::debug!(step = %step_id, "step started");
            }
            DiagnosticEvent::StepSucceeded { step_id } => {
                tracing::debug!(step = %step_id, "step succeeded");
            }
            DiagnosticEvent::StepSkipped { step_id } => {
                tracing::debug!(step = %step_id, "step skipped");
            }
            DiagnosticEvent::StepFailed { step_id, error } => {
                tracing::error!(step = %step_id, error = %error, "step failed");
            }
            DiagnosticEvent::RetryAttempt {
                tool,
                attempt,
                delay_ms,
            } => {
                tracing::warn!(tool = %tool, attempt, delay_ms, "retrying tool");
            }
            DiagnosticEvent::RetryExhausted { tool, attempts } => {
                tracing::error!(tool = %tool, attempts, "retries exhausted");
            }
            DiagnosticEvent::FallbackAttempt { strategy } => {
                tracing::warn!(strategy = %strategy, "falling back");
            }
            DiagnosticEvent::GroupStarted {
                group_id,
                member_count,
            } => {
                tracing::info!(group = %group_id, member_count, "parallel group started");
            }
            DiagnosticEvent::GroupCompleted { group_id, success } => {
                tracing::info!(group = %group_id, success, "parallel group completed");
            }
            DiagnosticEvent::WorkflowDeadlineExceeded { run_id } => {
                tracing::error!(run = %run_id, "workflow deadline exceeded");
            }
            DiagnosticEvent::WorkflowStarted { run_id, name } => {
                tracing::info!(run = %run_id, workflow = %name, "workflow started");
            }
            DiagnosticEvent::WorkflowCompleted { run_id, success } => {
                tracing::info!(run = %run_id, success, "workflow completed");
            }
            DiagnosticEvent::Custom { kind, payload } => {
                tracing::debug!(kind = %kind, payload = %payload, "custom event");
            }
        }
    }
}

/// Sink that drops every event. Useful in tests that don't care about
/// diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: DiagnosticEvent) {}
}
