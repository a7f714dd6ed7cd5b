//! Ordered fallback chains: try named strategies in turn, first success wins
//! (spec §4.2 "Fallback chain").

use std::future::Future;

use crate::diagnostics::{DiagnosticEvent, EventSink};

#[derive(Debug, Clone)]
pub struct FallbackExhausted<E> {
    pub failures: Vec<(String, E)>,
}

impl<E: std::fmt::Display> std::fmt::Display for FallbackExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all fallback strategies failed: ")?;
        let rendered: Vec<String> = self
            .failures
            .iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for FallbackExhausted<E> {}

/// Run each `(name, strategy)` pair in order, returning the first success.
/// If every strategy fails, aggregates every `(name, error)` pair (spec
/// §4.2 "Fallback chain").
pub async fn run_fallback_chain<T, E, F, Fut>(
    sink: &dyn EventSink,
    strategies: Vec<(String, F)>,
) -> Result<T, FallbackExhausted<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();
    for (name, strategy) in strategies {
        sink.emit(DiagnosticEvent::FallbackAttempt {
            strategy: name.clone(),
        });
        match strategy().await {
            Ok(value) => return Ok(value),
            Err(error) => failures.push((name, error)),
        }
    }
    Err(FallbackExhausted { failures })
}
