//! Core error types for corral.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running or stopping a worker
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker's run loop could not begin
    #[error("worker {id} failed to start: run loop already claimed")]
    Startup { id: usize },

    /// The worker did not finish draining within the caller's deadline
    #[error("worker {id} shutdown timed out after {deadline:?}")]
    ShutdownTimeout { id: usize, deadline: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_startup() {
        let err = WorkerError::Startup { id: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains("worker 2"));
        assert!(msg.contains("failed to start"));
    }

    #[test]
    fn test_error_display_shutdown_timeout() {
        let err = WorkerError::ShutdownTimeout {
            id: 0,
            deadline: Duration::from_secs(3),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("worker 0"));
        assert!(msg.contains("timed out"));
        assert!(msg.contains("3s"));
    }
}
