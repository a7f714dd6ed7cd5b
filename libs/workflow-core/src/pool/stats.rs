//! Worker Pool statistics (spec §4.5 "Statistics").

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Live, lock-free counters updated as tasks move through the pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    total_wait_ms: AtomicU64,
    active: AtomicUsize,
    queue_len: AtomicUsize,
}

/// A point-in-time read of [`PoolStats`] with derived rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStatsSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub active: usize,
    pub queue_len: usize,
    pub average_wait_ms: f64,
    pub utilization: f64,
}

impl PoolStats {
    pub(crate) fn record_enqueued(&self) {
        self.queue_len.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_dequeued(&self, wait: Duration) {
        self.queue_len.fetch_sub(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        self.total_wait_ms
            .fetch_add(wait.as_millis() as u64, Ordering::SeqCst);
    }

    pub(crate) fn record_completed(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failed(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_timed_out(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.timed_out.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self, max_concurrent: usize) -> PoolStatsSnapshot {
        let completed = self.completed.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        let timed_out = self.timed_out.load(Ordering::SeqCst);
        let active = self.active.load(Ordering::SeqCst);
        let queue_len = self.queue_len.load(Ordering::SeqCst);
        let total_wait_ms = self.total_wait_ms.load(Ordering::SeqCst);
        let finished = completed + failed + timed_out;
        let average_wait_ms = if finished == 0 {
            0.0
        } else {
            total_wait_ms as f64 / finished as f64
        };
        let utilization = if max_concurrent == 0 {
            0.0
        } else {
            active as f64 / max_concurrent as f64
        };
        PoolStatsSnapshot {
            completed,
            failed,
            timed_out,
            active,
            queue_len,
            average_wait_ms,
            utilization,
        }
    }
}
