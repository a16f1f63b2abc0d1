//! Corral Daemon Components
//!
//! Runs a fixed pool of heartbeat workers and coordinates their graceful
//! shutdown: an OS-signal halt bridge, a heartbeat aggregator, and the
//! orchestrator that owns the pool lifecycle.

pub mod aggregator;
pub mod orchestrator;
pub mod signals;

pub use orchestrator::{Orchestrator, ShutdownSummary};
