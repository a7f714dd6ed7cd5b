//! Parallel group definition (spec §3 "a parallel group").

use std::time::Duration;

use crate::condition::ValueExpr;
use crate::pool::WaitStrategy;

/// How a group's member step IDs are determined.
#[derive(Debug, Clone)]
pub enum StepList {
    /// A fixed set of step IDs declared up front.
    Literal(Vec<String>),
    /// Computed from context at dispatch time (spec §9 "Parallel step list
    /// as a computed value") — must resolve to a JSON array of strings,
    /// each naming a step already declared in the definition.
    Computed(ValueExpr),
}

/// A parallel group: a group identifier, its members, a wait strategy, and
/// the group's own concurrency/timeout/error-policy knobs.
#[derive(Debug, Clone)]
pub struct ParallelGroup {
    pub group_id: String,
    pub steps: StepList,
    pub strategy: WaitStrategy,
    pub max_concurrent: Option<usize>,
    pub timeout: Option<Duration>,
    /// When false, a non-successful outcome surfaces as an error carrying
    /// the `ParallelExecutionResult` rather than returning it normally.
    pub continue_on_error: bool,
}
