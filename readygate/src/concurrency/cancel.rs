//! Cancellation channel for dispatcher teardown.
//!
//! The owning context (an application lifecycle, a test) requests cancellation;
//! the dispatcher observes it between probe ticks. Cancellation is a
//! level-triggered flag: requesting it any number of times, from any dispatcher
//! state, is safe and never an error.

use tokio::sync::watch;

/// Transmitter side of the cancellation channel.
#[derive(Debug, Clone)]
pub struct CancelTx(watch::Sender<bool>);

impl CancelTx {
    /// Wraps a watch sender into a [`CancelTx`].
    pub fn new(tx: watch::Sender<bool>) -> Self {
        Self(tx)
    }

    /// Requests cancellation.
    ///
    /// Idempotent; cancelling an already-fired or already-cancelled dispatcher
    /// is a no-op.
    pub fn cancel(&self) {
        // Infallible send so cancellation works even when the dispatcher has
        // already terminated and dropped its receiver.
        self.0.send_replace(true);
    }

    /// Creates a new receiver subscription.
    pub fn subscribe(&self) -> CancelRx {
        CancelRx(self.0.subscribe())
    }
}

/// Receiver side of the cancellation channel.
#[derive(Debug, Clone)]
pub struct CancelRx(watch::Receiver<bool>);

impl CancelRx {
    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until cancellation is requested.
    pub async fn wait_for_cancel(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            // All transmitters are gone, so cancellation can never be
            // requested anymore; park instead of resolving spuriously.
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a new cancellation channel in the not-cancelled state.
pub fn create_cancel_channel() -> (CancelTx, CancelRx) {
    let (tx, rx) = watch::channel(false);
    (CancelTx::new(tx), CancelRx(rx))
}
