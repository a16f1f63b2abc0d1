//! Corral Daemon
//!
//! Runs a fixed pool of heartbeat workers and shuts them down gracefully
//! on SIGINT, SIGTERM, or SIGHUP.

use anyhow::Result;
use corral_core::PoolConfig;
use corral_daemon::{signals, Orchestrator};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Run the pool until an external halt request completes the shutdown
/// protocol.
pub async fn run() -> Result<()> {
    let halt = signals::bridge(&CancellationToken::new());
    let orchestrator = Orchestrator::new(PoolConfig::default(), halt);

    let summary = orchestrator.run().await?;
    if summary.timed_out > 0 {
        tracing::warn!(
            timed_out = summary.timed_out,
            "some workers were abandoned mid-drain"
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting corral daemon v{}", env!("CARGO_PKG_VERSION"));

    // Run async runtime
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run())
}
