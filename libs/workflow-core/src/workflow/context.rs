//! Per-run mutable state: results, errors, and deadline (spec §3
//! "WorkflowContext", §9 "Context sharing without aliasing hazards").

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::condition::ResultsView;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ContextError {
    #[error("step '{0}' already has a recorded result or error")]
    AlreadyResolved(String),
}

/// Owned by the [`super::manager::WorkflowManager`] for the duration of a
/// run; readers go through the narrow `get`/`has`-style methods below, and
/// each step writes only under its own key (spec §5 "Shared resources").
/// Critical sections are a single key read or write, guarded by a
/// `std::sync::RwLock` per spec §9's "guarded by a mutex (or one read/write
/// lock)" — never held across an `.await`.
pub struct WorkflowContext {
    pub run_id: String,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    results: RwLock<HashMap<String, serde_json::Value>>,
    errors: RwLock<HashMap<String, serde_json::Value>>,
    skipped: RwLock<HashSet<String>>,
}

impl WorkflowContext {
    #[must_use]
    pub fn new(run_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            user_id: None,
            request_id: None,
            started_at,
            deadline: None,
            results: RwLock::new(HashMap::new()),
            errors: RwLock::new(HashMap::new()),
            skipped: RwLock::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Record a successful result under `step_id` (spec invariant 5: a step
    /// never carries both a result and an error).
    pub fn write_result(&self, step_id: &str, value: serde_json::Value) -> Result<(), ContextError> {
        if self.is_resolved(step_id) {
            return Err(ContextError::AlreadyResolved(step_id.to_string()));
        }
        self.results.write().unwrap().insert(step_id.to_string(), value);
        Ok(())
    }

    pub fn write_error(&self, step_id: &str, value: serde_json::Value) -> Result<(), ContextError> {
        if self.is_resolved(step_id) {
            return Err(ContextError::AlreadyResolved(step_id.to_string()));
        }
        self.errors.write().unwrap().insert(step_id.to_string(), value);
        Ok(())
    }

    /// Mark a step as skipped (condition evaluated false): contributes
    /// nothing to results/errors, but counts as resolved for dependents
    /// (spec §4.7 "Condition").
    pub fn mark_skipped(&self, step_id: &str) {
        self.skipped.write().unwrap().insert(step_id.to_string());
    }

    #[must_use]
    pub fn is_skipped(&self, step_id: &str) -> bool {
        self.skipped.read().unwrap().contains(step_id)
    }

    #[must_use]
    pub fn has_result(&self, step_id: &str) -> bool {
        self.results.read().unwrap().contains_key(step_id)
    }

    #[must_use]
    pub fn has_error(&self, step_id: &str) -> bool {
        self.errors.read().unwrap().contains_key(step_id)
    }

    /// Whether `step_id` has run to completion one way or another: a
    /// recorded result, a recorded error, or a skip.
    #[must_use]
    pub fn is_resolved(&self, step_id: &str) -> bool {
        self.has_result(step_id) || self.has_error(step_id) || self.is_skipped(step_id)
    }

    #[must_use]
    pub fn deadline_exceeded(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Copy out a consistent point-in-time view for passing to C1/C3/C4/C6,
    /// all of which take a synchronous `&dyn ResultsView` — cloning here
    /// keeps the lock's critical section to the copy itself (spec §9).
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            results: self.results.read().unwrap().clone(),
            errors: self.errors.read().unwrap().clone(),
        }
    }
}

/// An owned, read-only copy of the results/errors maps at one instant.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    results: HashMap<String, serde_json::Value>,
    errors: HashMap<String, serde_json::Value>,
}

impl ResultsView for ContextSnapshot {
    fn result(&self, step_id: &str) -> Option<&serde_json::Value> {
        self.results.get(step_id)
    }

    fn error(&self, step_id: &str) -> Option<&serde_json::Value> {
        self.errors.get(step_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writing_twice_to_the_same_key_is_rejected() {
        let ctx = WorkflowContext::new("run", Utc::now());
        ctx.write_result("s1", json!(1)).unwrap();
        assert!(ctx.write_result("s1", json!(2)).is_err());
        assert!(ctx.write_error("s1", json!("boom")).is_err());
    }

    #[test]
    fn skipped_step_is_resolved_but_has_no_value() {
        let ctx = WorkflowContext::new("run", Utc::now());
        ctx.mark_skipped("s1");
        assert!(ctx.is_resolved("s1"));
        assert!(!ctx.has_result("s1"));
        assert!(!ctx.has_error("s1"));
    }

    #[test]
    fn snapshot_reflects_point_in_time_state() {
        let ctx = WorkflowContext::new("run", Utc::now());
        ctx.write_result("s1", json!({"x": 1})).unwrap();
        let snap = ctx.snapshot();
        assert_eq!(snap.result("s1"), Some(&json!({"x": 1})));
        ctx.write_result("s2", json!(2)).unwrap();
        assert_eq!(snap.result("s2"), None);
    }

    #[test]
    fn deadline_exceeded_compares_against_now() {
        let epoch = Utc::now();
        let ctx = WorkflowContext::new("run", epoch).with_deadline(epoch + chrono::Duration::seconds(10));
        assert!(!ctx.deadline_exceeded(epoch));
        assert!(ctx.deadline_exceeded(epoch + chrono::Duration::seconds(11)));
    }
}
