//! Process-wide global throttle gate

use tokio::sync::watch;

/// Open/closed flag shared by every bucket
///
/// While closed, no bucket may start a request. Wake order among waiters is
/// best effort: all waiters are notified together when the gate reopens.
#[derive(Debug)]
pub struct GlobalGate {
    open: watch::Sender<bool>,
}

impl GlobalGate {
    /// Create an open gate
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self { open }
    }

    /// Check whether requests may currently proceed
    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Suspend until the gate is open (returns immediately if it already is)
    pub async fn wait_open(&self) {
        let mut rx = self.open.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|open| *open).await;
    }

    /// Close the gate
    ///
    /// Returns `true` if this call closed it, `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.open.send_replace(false)
    }

    /// Reopen the gate and wake every waiter
    pub fn reopen(&self) {
        self.open.send_replace(true);
    }
}

impl Default for GlobalGate {
    fn default() -> Self {
        Self::new()
    }
}
