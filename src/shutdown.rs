//! Shutdown signal for connection handlers.

use tokio::sync::broadcast;

/// Tracks whether a connection handler has been told to stop.
///
/// The server sends at most one signal, by dropping the broadcast sender. Once observed, the
/// signal is remembered so later calls return immediately.
#[derive(Debug)]
pub(crate) struct Shutdown {
    received: bool,
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    pub(crate) fn new(notify: broadcast::Receiver<()>) -> Self {
        Self {
            received: false,
            notify,
        }
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.received
    }

    /// Waits for the signal unless it was already received.
    pub(crate) async fn recv(&mut self) {
        if self.received {
            return;
        }
        // A closed channel counts as the signal
        let _ = self.notify.recv().await;
        self.received = true;
    }
}
