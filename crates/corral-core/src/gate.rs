//! One-shot broadcast gate used as the pool's shutdown barrier.

use tokio::sync::watch;

/// A one-shot gate with any number of waiters.
///
/// Starts closed, opens at most once, and releases every waiter —
/// including waiters that only start waiting after it has opened, so no
/// wakeup can be missed.
#[derive(Debug)]
pub struct Gate {
    opened: watch::Sender<bool>,
}

impl Gate {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (opened, _) = watch::channel(false);
        Self { opened }
    }

    /// Open the gate, releasing all current and future waiters. Idempotent.
    pub fn open(&self) {
        // send_replace rather than send: must succeed with no live receivers
        self.opened.send_replace(true);
    }

    /// Whether the gate has opened.
    pub fn is_open(&self) -> bool {
        *self.opened.borrow()
    }

    /// Wait until the gate opens. Returns immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.opened.subscribe();
        // wait_for inspects the current value before suspending, so an
        // open that happened before this call is observed at once
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
