//! Wait strategies for multi-task execution (spec §4.5 "Execution modes").

use super::pool::PoolError;

/// Which rule governs when a batch's outcome is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Succeed only if every task succeeds; fail on first error.
    All,
    /// Succeed as soon as any task succeeds; fail only if all fail.
    Any,
    /// Wait for all; report successes and errors without throwing.
    AllSettled,
    /// Return the first completion, success or error.
    Race,
}

/// The outcome of `executeWithStrategy` over a batch of tasks.
#[derive(Debug, Clone)]
pub struct StrategyOutcome<T> {
    pub success: bool,
    pub results: Vec<(String, T)>,
    pub errors: Vec<(String, PoolError)>,
    /// Tasks never awaited to completion — cancelled peers under `any`/`race`,
    /// or never dispatched before an `All` early exit.
    pub skipped: Vec<String>,
}
