//! Idempotency-aware retry loop around an arbitrary effectful thunk (spec
//! §4.2 "Per-tool retry").

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::clock::Clock;
use crate::diagnostics::{DiagnosticEvent, EventSink};

use super::policy::{ErrorClass, RetryPolicy};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RetryError<E> {
    #[error("retries exhausted after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: E },
    #[error("error class not retryable under this policy: {0}")]
    NotRetryable(E),
}

impl<E> RetryError<E> {
    #[must_use]
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last_error, .. } | RetryError::NotRetryable(last_error) => {
                last_error
            }
        }
    }
}

/// Drive `thunk` to success, retrying per `policy` (spec §4.2 steps 1-5).
///
/// `classify` maps a failure to an [`ErrorClass`] so the policy's retryable
/// set can gate whether another attempt is made. `thunk` receives the
/// 1-based attempt number it is being invoked as.
pub async fn retry_with_policy<T, E, F, Fut, C>(
    tool_name: &str,
    policy: &RetryPolicy,
    clock: &dyn Clock,
    sink: &dyn EventSink,
    mut classify: C,
    mut thunk: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: FnMut(&E) -> ErrorClass,
{
    let max_attempts = policy.effective_max_attempts();
    let mut attempt: u32 = 1;
    loop {
        match thunk(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let class = classify(&error);
                if !policy.allows(class) {
                    return Err(RetryError::NotRetryable(error));
                }
                if attempt >= max_attempts {
                    sink.emit(DiagnosticEvent::RetryExhausted {
                        tool: tool_name.to_string(),
                        attempts: attempt,
                    });
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: error,
                    });
                }
                let delay = jittered_delay(policy, attempt);
                sink.emit(DiagnosticEvent::RetryAttempt {
                    tool: tool_name.to_string(),
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                });
                clock.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// `min(initialDelay * multiplier^(attempt-1), maxDelay)` plus uniform
/// jitter in `[0, jitterBound]` (spec §4.2 step 5).
fn jittered_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy.base_delay(attempt);
    if policy.jitter_bound.is_zero() {
        return base;
    }
    let jitter_ms = rand::thread_rng().gen_range(0..=policy.jitter_bound.as_millis() as u64);
    base + Duration::from_millis(jitter_ms)
}
