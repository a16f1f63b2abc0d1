//! Counters for pool observability.
//!
//! Display-only: nothing in the shutdown protocol depends on these values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic counters describing a pool's lifetime.
pub struct PoolMetrics {
    /// Total heartbeat events observed by the aggregator
    heartbeats_total: AtomicU64,
    /// Workers that finished their drain within the shutdown deadline
    workers_stopped: AtomicU64,
    /// Workers whose shutdown caller gave up at the deadline
    workers_timed_out: AtomicU64,
    /// Pool start time
    start_time: Instant,
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            heartbeats_total: AtomicU64::new(0),
            workers_stopped: AtomicU64::new(0),
            workers_timed_out: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one observed heartbeat and return the new running count.
    ///
    /// Called only from the aggregator task; no other task mutates the
    /// heartbeat counter.
    pub fn record_heartbeat(&self) -> u64 {
        self.heartbeats_total.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a worker that stopped within its deadline.
    pub fn record_stopped(&self) {
        self.workers_stopped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker whose shutdown timed out.
    pub fn record_timed_out(&self) {
        self.workers_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Heartbeats observed so far.
    pub fn heartbeats(&self) -> u64 {
        self.heartbeats_total.load(Ordering::Relaxed)
    }

    /// Workers that stopped cleanly.
    pub fn stopped(&self) -> u64 {
        self.workers_stopped.load(Ordering::Relaxed)
    }

    /// Workers that timed out.
    pub fn timed_out(&self) -> u64 {
        self.workers_timed_out.load(Ordering::Relaxed)
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
