//! A cancellable worker with bounded, idempotent shutdown.
//!
//! The run loop emits one heartbeat per work unit over a rendezvous-style
//! handoff, polls its cancellation flag between units, and performs a
//! deliberately slow drain step before marking itself done. Cancellation
//! is cooperative: the drain step cannot be interrupted, so it can outlive
//! a shutdown caller's deadline.

use crate::config::PoolConfig;
use crate::error::WorkerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// A unit-of-work completion event emitted by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// Id of the emitting worker
    pub worker_id: usize,
    /// Position in that worker's emission order, starting at 0
    pub seq: u64,
}

/// Observable lifecycle state of a worker.
///
/// A shutdown timeout is the *caller's* observation, reported through
/// [`WorkerError::ShutdownTimeout`]; the worker itself stays in
/// `Cancelling` until its drain finishes, even after the caller gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// The run loop is producing work units
    Running,
    /// Cancellation was requested; the worker is draining
    Cancelling,
    /// The run loop has exited
    Stopped,
}

/// A long-running worker task in the pool.
pub struct Worker {
    id: usize,
    work_interval: Duration,
    drain_delay: Duration,
    /// Cancellation flag, set exactly once (compare-and-set guarded)
    cancelled: AtomicBool,
    /// Guards the run loop against being started twice
    claimed: AtomicBool,
    /// Completion flag, flipped once when the run loop exits
    done: watch::Sender<bool>,
    heartbeats: mpsc::Sender<Heartbeat>,
}

impl Worker {
    /// Create a worker and the receiving end of its heartbeat channel.
    pub fn new(id: usize, config: &PoolConfig) -> (Self, mpsc::Receiver<Heartbeat>) {
        // capacity 1: a send completes only once the previous event has
        // been taken, so a slow consumer stalls the work loop instead of
        // heartbeats being dropped or duplicated
        let (heartbeats, heartbeat_rx) = mpsc::channel(1);
        let (done, _) = watch::channel(false);

        (
            Self {
                id,
                work_interval: config.work_interval(),
                drain_delay: config.drain_delay(),
                cancelled: AtomicBool::new(false),
                claimed: AtomicBool::new(false),
                done,
                heartbeats,
            },
            heartbeat_rx,
        )
    }

    /// Worker id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        if *self.done.borrow() {
            WorkerState::Stopped
        } else if self.cancelled.load(Ordering::SeqCst) {
            WorkerState::Cancelling
        } else {
            WorkerState::Running
        }
    }

    /// Drive the work loop until cancellation, then drain and mark done.
    ///
    /// Starts at most once; a second call reports a startup failure
    /// without disturbing the running loop.
    pub async fn run(&self) -> Result<(), WorkerError> {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkerError::Startup { id: self.id });
        }

        let mut seq = 0u64;
        while !self.cancelled.load(Ordering::SeqCst) {
            tracing::info!(worker = self.id, seq, "doing work");
            self.emit_heartbeat(seq).await;
            seq += 1;
            tokio::time::sleep(self.work_interval).await;
        }

        // internal cleanup, slower than a default caller's patience
        tracing::debug!(worker = self.id, "draining");
        tokio::time::sleep(self.drain_delay).await;

        self.done.send_replace(true);
        tracing::debug!(worker = self.id, units = seq, "run loop exited");
        Ok(())
    }

    /// Request shutdown and wait for the worker to finish, bounded by
    /// `deadline`.
    ///
    /// Idempotent: concurrent or repeated callers set the cancellation
    /// flag at most once, and every caller waits on the same completion
    /// flag. The caller is never blocked past its deadline, even when the
    /// worker's drain is still running in the background.
    pub async fn request_shutdown(&self, deadline: Duration) -> Result<(), WorkerError> {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!(worker = self.id, "shutting down");
        }

        let mut done = self.done.subscribe();
        let finished = tokio::time::timeout(deadline, done.wait_for(|finished| *finished))
            .await
            .is_ok();
        if finished {
            tracing::debug!(worker = self.id, "done before the deadline");
            Ok(())
        } else {
            Err(WorkerError::ShutdownTimeout {
                id: self.id,
                deadline,
            })
        }
    }

    async fn emit_heartbeat(&self, seq: u64) {
        // a closed receiver means the pool is tearing down; the loop will
        // observe the cancellation flag on its next pass
        let _ = self
            .heartbeats
            .send(Heartbeat {
                worker_id: self.id,
                seq,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::time::timeout;

    fn fast_config(work_ms: u64, drain_ms: u64) -> PoolConfig {
        PoolConfig {
            workers: 1,
            work_interval_ms: work_ms,
            drain_delay_ms: drain_ms,
            shutdown_deadline_ms: 1000,
        }
    }

    /// Spawn the run loop and a drain task for the heartbeat channel.
    fn spawn_worker(config: &PoolConfig) -> Arc<Worker> {
        let (worker, mut rx) = Worker::new(0, config);
        let worker = Arc::new(worker);

        let runner = worker.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });
        tokio::spawn(async move { while rx.recv().await.is_some() {} });

        worker
    }

    #[tokio::test]
    async fn test_shutdown_before_deadline_succeeds() {
        let worker = spawn_worker(&fast_config(5, 20));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        let result = worker.request_shutdown(Duration::from_millis(500)).await;
        let elapsed = started.elapsed();

        assert!(result.is_ok());
        // the wait tracks the drain step, not the full deadline
        assert!(elapsed < Duration::from_millis(300), "waited {:?}", elapsed);
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_times_out_at_deadline() {
        let worker = spawn_worker(&fast_config(5, 500));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        let result = worker.request_shutdown(Duration::from_millis(50)).await;
        let elapsed = started.elapsed();

        assert!(matches!(
            result,
            Err(WorkerError::ShutdownTimeout { id: 0, .. })
        ));
        assert!(elapsed >= Duration::from_millis(50));
        // the caller must not be held until the drain actually finishes
        assert!(elapsed < Duration::from_millis(400), "waited {:?}", elapsed);
        assert_eq!(worker.state(), WorkerState::Cancelling);
    }

    #[tokio::test]
    async fn test_concurrent_shutdown_requests_are_idempotent() {
        let worker = spawn_worker(&fast_config(5, 10));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut callers = Vec::new();
        for _ in 0..8 {
            let worker = worker.clone();
            callers.push(tokio::spawn(async move {
                worker.request_shutdown(Duration::from_millis(500)).await
            }));
        }

        // every caller observes the same final state
        for caller in callers {
            let result = timeout(Duration::from_secs(1), caller).await.unwrap();
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_repeated_shutdown_after_completion() {
        let worker = spawn_worker(&fast_config(5, 10));
        tokio::time::sleep(Duration::from_millis(20)).await;

        worker
            .request_shutdown(Duration::from_millis(500))
            .await
            .unwrap();
        // a second request is a no-op and resolves immediately
        let started = Instant::now();
        worker
            .request_shutdown(Duration::from_millis(500))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_heartbeats_arrive_in_emission_order() {
        let (worker, mut rx) = Worker::new(7, &fast_config(1, 5));
        let worker = Arc::new(worker);

        let runner = worker.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });

        for expected in 0..5u64 {
            let hb = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(hb.worker_id, 7);
            assert_eq!(hb.seq, expected);
        }

        // release the work loop from its handoff before cancelling
        drop(rx);
        worker
            .request_shutdown(Duration::from_millis(500))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_slow_consumer_never_loses_heartbeats() {
        let (worker, mut rx) = Worker::new(0, &fast_config(1, 5));
        let worker = Arc::new(worker);

        let runner = worker.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });

        // stall consumption: the work loop blocks on its handoff instead
        // of dropping or duplicating events
        tokio::time::sleep(Duration::from_millis(50)).await;
        for expected in 0..3u64 {
            let hb = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(hb.seq, expected);
        }

        drop(rx);
        worker
            .request_shutdown(Duration::from_millis(500))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_loop_starts_at_most_once() {
        let worker = spawn_worker(&fast_config(5, 10));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = worker.run().await;
        assert!(matches!(second, Err(WorkerError::Startup { id: 0 })));

        worker
            .request_shutdown(Duration::from_millis(500))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let worker = spawn_worker(&fast_config(5, 200));
        assert_eq!(worker.state(), WorkerState::Running);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // deadline shorter than the drain: observe the Cancelling window
        let result = worker.request_shutdown(Duration::from_millis(20)).await;
        assert!(result.is_err());
        assert_eq!(worker.state(), WorkerState::Cancelling);

        // the drain still finishes in the background
        worker
            .request_shutdown(Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }
}
