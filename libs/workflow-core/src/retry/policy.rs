//! Retry policy shape and the built-in default policy table (spec §4.2
//! "Defaults").

use std::collections::HashSet;
use std::time::Duration;

/// Error classes a [`RetryPolicy`] can mark as retryable. Tool handlers
/// classify their own failures into these; the engine never inspects error
/// strings to guess a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Transient,
    ConnectionReset,
    Timeout,
    HostUnreachable,
    RateLimited,
    Permanent,
}

/// Per-tool retry configuration (spec §3 "RetryPolicy").
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub jitter_bound: Duration,
    pub idempotent: bool,
    /// Empty means "retry on any error class".
    pub retryable: HashSet<ErrorClass>,
}

impl RetryPolicy {
    /// A single attempt, no retry. Used for non-idempotent tools regardless
    /// of what's configured (spec §4.2 step 1).
    #[must_use]
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            idempotent: false,
            ..Self::default_idempotent()
        }
    }

    /// Default policy for idempotent network-retrieval tools.
    #[must_use]
    pub fn default_idempotent() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter_bound: Duration::from_millis(100),
            idempotent: true,
            retryable: [
                ErrorClass::Transient,
                ErrorClass::ConnectionReset,
                ErrorClass::Timeout,
                ErrorClass::HostUnreachable,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// The policy actually in effect: non-idempotent tools are pinned to a
    /// single attempt no matter what `max_attempts` says (spec §4.2 step 1).
    #[must_use]
    pub fn effective_max_attempts(&self) -> u32 {
        if self.idempotent {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    #[must_use]
    pub fn allows(&self, class: ErrorClass) -> bool {
        self.retryable.is_empty() || self.retryable.contains(&class)
    }

    /// `min(initialDelay * multiplier^(attempt-1), maxDelay)`, attempt is
    /// 1-based (spec §4.2 step 5, jitter added separately by the caller).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_idempotent()
    }
}

/// Built-in policy table keyed by tool name, falling back to a
/// category-based default when the name isn't known (spec §4.2 "Defaults").
#[derive(Debug, Default)]
pub struct PolicyTable {
    by_name: std::collections::HashMap<String, RetryPolicy>,
}

impl PolicyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, tool_name: impl Into<String>, policy: RetryPolicy) -> &mut Self {
        self.by_name.insert(tool_name.into(), policy);
        self
    }

    /// Resolve the effective policy for a tool, falling back to a
    /// category-derived default when unregistered: mutating/shell-style
    /// tools (named by convention) default to non-idempotent, everything
    /// else defaults to the idempotent network-retrieval shape.
    #[must_use]
    pub fn resolve(&self, tool_name: &str, declared_idempotent: Option<bool>) -> RetryPolicy {
        if let Some(policy) = self.by_name.get(tool_name) {
            return policy.clone();
        }
        match declared_idempotent {
            Some(false) => RetryPolicy::single_attempt(),
            _ => RetryPolicy::default_idempotent(),
        }
    }
}
