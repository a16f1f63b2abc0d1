//! Fan-in consumer for worker heartbeats.
//!
//! An observability side channel: counts the combined heartbeat stream
//! and inserts a display grouping break after every full round of the
//! pool. Nothing in the shutdown protocol depends on it, and a stopped
//! aggregator must never stall a worker — back-pressure runs one hop,
//! worker to aggregator, never the other way.

use corral_core::{Heartbeat, PoolMetrics};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Consumes the fanned-in heartbeat stream until the pool halts.
pub struct Aggregator {
    pool_size: usize,
    metrics: Arc<PoolMetrics>,
    halt: CancellationToken,
}

impl Aggregator {
    /// Create an aggregator for a pool of `pool_size` workers.
    pub fn new(pool_size: usize, metrics: Arc<PoolMetrics>, halt: CancellationToken) -> Self {
        Self {
            pool_size,
            metrics,
            halt,
        }
    }

    /// Run until the pool halts or every heartbeat sender is gone.
    pub async fn run(self, mut events: mpsc::Receiver<Heartbeat>) {
        loop {
            tokio::select! {
                _ = self.halt.cancelled() => break,
                event = events.recv() => match event {
                    Some(heartbeat) => self.observe(heartbeat),
                    None => break,
                },
            }
        }

        tracing::debug!(heartbeats = self.metrics.heartbeats(), "aggregator stopped");
    }

    fn observe(&self, heartbeat: Heartbeat) {
        let seen = self.metrics.record_heartbeat();
        tracing::info!(
            worker = heartbeat.worker_id,
            seq = heartbeat.seq,
            "heartbeat"
        );

        if self.pool_size > 0 && seen % self.pool_size as u64 == 0 {
            // one full round of the pool has reported in
            tracing::info!(heartbeats = seen, "pool round complete");
        }
    }
}
