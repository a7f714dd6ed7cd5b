//! Injectable clock abstraction.
//!
//! The engine never calls `Instant::now`/`sleep` directly so that tests can
//! substitute a virtual clock (spec §6.3).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of time and sleep for the engine.
///
/// `SystemClock` is the production implementation; `ManualClock` is a
/// virtual clock for deterministic tests.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock for tests: `now()` is fixed at construction and advances
/// only when the test explicitly calls [`ManualClock::advance`]. `sleep`
/// resolves immediately — tests that need to assert on elapsed time read
/// [`ManualClock::elapsed_sleeps`] instead of relying on real wall time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch: DateTime<Utc>,
    offset_ms: Arc<AtomicU64>,
    elapsed_sleeps: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock starting at the given instant.
    #[must_use]
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            offset_ms: Arc::new(AtomicU64::new(0)),
            elapsed_sleeps: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the clock by `duration` without sleeping.
    pub fn advance(&self, duration: Duration) {
        self.offset_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Total duration ever passed to [`Clock::sleep`], for test assertions.
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.elapsed_sleeps.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let offset = self.offset_ms.load(Ordering::SeqCst);
        self.epoch + chrono::Duration::milliseconds(offset as i64)
    }

    async fn sleep(&self, duration: Duration) {
        self.elapsed_sleeps
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_explicitly() {
        let epoch = Utc::now();
        let clock = ManualClock::new(epoch);
        assert_eq!(clock.now(), epoch);
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), epoch + chrono::Duration::seconds(5));
    }

    #[tokio::test]
    async fn manual_clock_sleep_does_not_block_but_records() {
        let clock = ManualClock::new(Utc::now());
        clock.sleep(Duration::from_millis(100)).await;
        clock.sleep(Duration::from_millis(50)).await;
        assert_eq!(clock.total_slept(), Duration::from_millis(150));
    }

    #[tokio::test]
    async fn system_clock_sleeps_for_real() {
        let clock = SystemClock;
        let start = std::time::Instant::now();
        clock.sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
