//! Configuration for the corral worker pool.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker pool configuration
///
/// The stock defaults give each worker a drain step (5s) longer than the
/// shutdown deadline (3s), so the default binary exercises the timeout
/// path of the shutdown protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of workers in the pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause between synthetic work units, in milliseconds
    #[serde(default = "default_work_interval")]
    pub work_interval_ms: u64,

    /// Duration of a worker's internal drain step after it observes
    /// cancellation, in milliseconds
    #[serde(default = "default_drain_delay")]
    pub drain_delay_ms: u64,

    /// How long a shutdown caller waits for a worker to finish before
    /// reporting a timeout, in milliseconds
    #[serde(default = "default_shutdown_deadline")]
    pub shutdown_deadline_ms: u64,
}

fn default_workers() -> usize {
    3
}

fn default_work_interval() -> u64 {
    1000
}

fn default_drain_delay() -> u64 {
    5000
}

fn default_shutdown_deadline() -> u64 {
    3000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            work_interval_ms: default_work_interval(),
            drain_delay_ms: default_drain_delay(),
            shutdown_deadline_ms: default_shutdown_deadline(),
        }
    }
}

impl PoolConfig {
    /// Pause between work units.
    pub fn work_interval(&self) -> Duration {
        Duration::from_millis(self.work_interval_ms)
    }

    /// Duration of the drain step.
    pub fn drain_delay(&self) -> Duration {
        Duration::from_millis(self.drain_delay_ms)
    }

    /// Per-worker bound on a shutdown caller's wait.
    pub fn shutdown_deadline(&self) -> Duration {
        Duration::from_millis(self.shutdown_deadline_ms)
    }
}
