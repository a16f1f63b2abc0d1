//! Worker pool lifecycle management.
//!
//! The orchestrator starts the pool, waits for the halt lifetime to end,
//! opens the shutdown gate, and joins every supervising task. Each worker
//! gets three tasks: its run loop, a heartbeat forwarder into the
//! aggregator, and a supervisor that performs the bounded shutdown.

use anyhow::Result;
use corral_core::{Gate, Heartbeat, PoolConfig, PoolMetrics, Worker, WorkerError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;

/// Outcome of a full pool shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownSummary {
    /// Workers that stopped within the shutdown deadline
    pub stopped: usize,
    /// Workers whose supervisor gave up at the deadline
    pub timed_out: usize,
    /// Heartbeats observed over the pool's lifetime
    pub heartbeats: u64,
}

/// Owns the worker pool from startup through coordinated shutdown.
pub struct Orchestrator {
    config: PoolConfig,
    metrics: Arc<PoolMetrics>,
    halt: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator whose pool lives until `halt` is cancelled.
    pub fn new(config: PoolConfig, halt: CancellationToken) -> Self {
        Self {
            config,
            metrics: Arc::new(PoolMetrics::new()),
            halt,
        }
    }

    /// The pool's halt lifetime. Cancelling it starts the shutdown
    /// protocol.
    pub fn halt_token(&self) -> CancellationToken {
        self.halt.clone()
    }

    /// Pool metrics handle.
    pub fn metrics(&self) -> Arc<PoolMetrics> {
        self.metrics.clone()
    }

    /// Run the pool until halt, then coordinate bounded shutdown of every
    /// worker.
    ///
    /// A per-worker timeout is logged and counted, never escalated: the
    /// pool always proceeds to completion once every supervisor returns.
    pub async fn run(&self) -> Result<ShutdownSummary> {
        let pool_size = self.config.workers;
        let gate = Arc::new(Gate::new());

        let (event_tx, event_rx) = mpsc::channel(pool_size.max(1));
        let aggregator = Aggregator::new(pool_size, self.metrics.clone(), self.halt.clone());
        tokio::spawn(aggregator.run(event_rx));

        tracing::info!(workers = pool_size, "starting worker pool");

        let mut supervisors = Vec::with_capacity(pool_size);
        for id in 0..pool_size {
            supervisors.push(self.start_worker(id, &gate, event_tx.clone()));
        }
        drop(event_tx);

        self.halt.cancelled().await;

        // the waiting message strictly precedes any shutdown attempt:
        // every supervisor is still parked on the gate
        tracing::info!(workers = pool_size, "waiting for workers to stop");
        gate.open();

        let mut summary = ShutdownSummary {
            stopped: 0,
            timed_out: 0,
            heartbeats: 0,
        };
        for supervisor in supervisors {
            match supervisor.await {
                Ok(Ok(())) => {
                    summary.stopped += 1;
                    self.metrics.record_stopped();
                }
                Ok(Err(_)) => {
                    summary.timed_out += 1;
                    self.metrics.record_timed_out();
                }
                Err(e) => {
                    // a crashed supervisor must not stall the rest, and
                    // still counts against both the summary and metrics
                    tracing::error!(error = %e, "supervisor task failed");
                    summary.timed_out += 1;
                    self.metrics.record_timed_out();
                }
            }
        }
        summary.heartbeats = self.metrics.heartbeats();

        tracing::info!(
            stopped = summary.stopped,
            timed_out = summary.timed_out,
            heartbeats = summary.heartbeats,
            "pool has shut down"
        );
        Ok(summary)
    }

    /// Spawn one worker's run loop, heartbeat forwarder, and supervisor.
    ///
    /// The returned handle is the supervisor: it resolves once the
    /// bounded shutdown attempt has reported, independently of the other
    /// workers.
    fn start_worker(
        &self,
        id: usize,
        gate: &Arc<Gate>,
        events: mpsc::Sender<Heartbeat>,
    ) -> JoinHandle<Result<(), WorkerError>> {
        let (worker, heartbeats) = Worker::new(id, &self.config);
        let worker = Arc::new(worker);

        let runner = worker.clone();
        tokio::spawn(async move {
            if let Err(e) = runner.run().await {
                tracing::error!(worker = id, error = %e, "worker failed to start");
            }
        });

        tokio::spawn(forward_heartbeats(heartbeats, events));

        let gate = gate.clone();
        let halt = self.halt.clone();
        let deadline = self.config.shutdown_deadline();
        tokio::spawn(async move {
            halt.cancelled().await;
            // no shutdown attempt may begin before the orchestrator has
            // acknowledged the halt and opened the gate
            gate.wait().await;

            match worker.request_shutdown(deadline).await {
                Ok(()) => {
                    tracing::info!(worker = id, "worker is done");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(worker = id, error = %e, "worker shutdown failed");
                    Err(e)
                }
            }
        })
    }
}

/// One fan-in hop: forward a single worker's heartbeats into the
/// aggregator's channel, preserving that worker's emission order.
async fn forward_heartbeats(mut from: mpsc::Receiver<Heartbeat>, into: mpsc::Sender<Heartbeat>) {
    while let Some(heartbeat) = from.recv().await {
        if into.send(heartbeat).await.is_err() {
            // aggregator is gone; keep draining so the worker is never
            // wedged on its handoff
            while from.recv().await.is_some() {}
            return;
        }
    }
}
