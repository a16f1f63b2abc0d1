//! Corral Core Components
//!
//! This crate provides the building blocks for the corral daemon: the
//! cancellable heartbeat worker, the one-shot shutdown gate, pool
//! configuration, and pool metrics.

mod config;
mod error;
mod gate;
mod metrics;
mod worker;

pub use config::PoolConfig;
pub use error::WorkerError;
pub use gate::Gate;
pub use metrics::PoolMetrics;
pub use worker::{Heartbeat, Worker, WorkerState};
