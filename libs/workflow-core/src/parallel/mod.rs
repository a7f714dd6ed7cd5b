//! Parallel Execution Manager (C6): run a parallel group over the Worker
//! Pool under a chosen wait strategy (spec §4.6).

mod group;
mod manager;
mod result;

pub use group::{ParallelGroup, StepList};
pub use manager::{ParallelError, ParallelExecutionManager, StepExecutor};
pub use result::ParallelExecutionResult;
