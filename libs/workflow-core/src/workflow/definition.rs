//! A workflow's declarative shape (spec §3 "WorkflowDefinition").

use std::time::Duration;

use super::step::WorkflowStep;

/// Pool-wide concurrency defaults a run can declare (spec §3 "an optional
/// pool configuration").
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_concurrent: usize,
    pub default_timeout: Option<Duration>,
}

/// Immutable once submitted to the [`super::manager::WorkflowManager`]
/// (spec §3).
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    pub max_duration: Option<Duration>,
    pub pool: Option<PoolConfig>,
}

impl WorkflowDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
            max_duration: None,
            pool: None,
        }
    }

    #[must_use]
    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}
