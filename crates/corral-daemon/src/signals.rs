//! Signal handling for graceful shutdown.
//!
//! Converts the first external halt request (SIGINT, SIGTERM, or SIGHUP)
//! into a single cancellation of the pool's halt token.

use std::fmt;
use tokio_util::sync::CancellationToken;

/// External termination reasons recognized by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltSignal {
    /// Interrupt request (SIGINT / Ctrl+C)
    Interrupt,
    /// Terminate request (SIGTERM)
    Terminate,
    /// Hang-up request (SIGHUP)
    Hangup,
}

impl fmt::Display for HaltSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltSignal::Interrupt => write!(f, "SIGINT"),
            HaltSignal::Terminate => write!(f, "SIGTERM"),
            HaltSignal::Hangup => write!(f, "SIGHUP"),
        }
    }
}

/// Bridge external halt requests into a cancellable lifetime.
///
/// Returns a child of `parent` that ends when the first halt signal
/// arrives, or when the parent lifetime itself ends — whichever happens
/// first, and at most once. Signals after the first have no further
/// effect.
pub fn bridge(parent: &CancellationToken) -> CancellationToken {
    let halt = parent.child_token();
    let trigger = halt.clone();

    tokio::spawn(async move {
        tokio::select! {
            sig = wait_for_halt() => {
                tracing::info!(signal = %sig, "halt requested, cancelling the pool");
                trigger.cancel();
            }
            _ = trigger.cancelled() => {
                tracing::debug!("pool ended before an external halt arrived");
            }
        }
    });

    halt
}

/// Wait for the first SIGINT, SIGTERM, or SIGHUP.
#[cfg(unix)]
async fn wait_for_halt() -> HaltSignal {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    let mut sighup = signal(SignalKind::hangup()).expect("Failed to register SIGHUP handler");

    tokio::select! {
        _ = sigint.recv() => HaltSignal::Interrupt,
        _ = sigterm.recv() => HaltSignal::Terminate,
        _ = sighup.recv() => HaltSignal::Hangup,
    }
}

#[cfg(not(unix))]
async fn wait_for_halt() -> HaltSignal {
    let _ = tokio::signal::ctrl_c().await;
    HaltSignal::Interrupt
}
