//! A single unit of work submitted to the Worker Pool (spec §4.5 "Task
//! contract").

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A task carries an identifier, a thunk producing a value, and an optional
/// task-level timeout.
pub struct PoolTask<T> {
    pub id: String,
    pub timeout: Option<Duration>,
    pub(crate) future: BoxFuture<Result<T, String>>,
}

impl<T: Send + 'static> PoolTask<T> {
    pub fn new<F>(id: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<T, String>> + Send + 'static,
    {
        Self {
            id: id.into(),
            timeout: None,
            future: Box::pin(future),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
