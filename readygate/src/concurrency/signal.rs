//! Readiness signal channel.
//!
//! A single-slot, last-write-wins value written by the downstream subsystem and
//! read by the readiness probe. The slot starts unset, and unset is distinct
//! from every legitimate sentinel value, so a channel that was never written
//! can never read as ready. Readers always observe the most recent write.

use tokio::sync::watch;

/// Transmitter side of the readiness signal channel.
///
/// Handed to the downstream subsystem, which writes a sentinel value once it
/// can accept requests. Writes are atomic single-value replacements; no
/// ordering is guaranteed across multiple writers.
#[derive(Debug, Clone)]
pub struct SignalTx(watch::Sender<Option<String>>);

impl SignalTx {
    /// Wraps a watch sender into a [`SignalTx`].
    pub fn new(tx: watch::Sender<Option<String>>) -> Self {
        Self(tx)
    }

    /// Replaces the slot with `value`, overwriting any previous announcement.
    pub fn announce(&self, value: impl Into<String>) {
        // Infallible send so announcements made before any reader subscribes
        // are not lost.
        self.0.send_replace(Some(value.into()));
    }

    /// Returns the slot to the unset state.
    pub fn clear(&self) {
        self.0.send_replace(None);
    }

    /// Creates a new receiver subscription.
    pub fn subscribe(&self) -> SignalRx {
        SignalRx(self.0.subscribe())
    }
}

/// Receiver side of the readiness signal channel.
#[derive(Debug, Clone)]
pub struct SignalRx(watch::Receiver<Option<String>>);

impl SignalRx {
    /// Returns the current slot contents, or [`None`] when unset.
    pub fn current(&self) -> Option<String> {
        self.0.borrow().clone()
    }

    /// Returns whether the slot currently holds the given sentinel.
    pub fn matches(&self, sentinel: &str) -> bool {
        self.0.borrow().as_deref() == Some(sentinel)
    }

    /// Waits until the slot contents change.
    ///
    /// Resolves also when the last transmitter is dropped, at which point the
    /// slot can no longer change.
    pub async fn changed(&mut self) {
        let _ = self.0.changed().await;
    }
}

/// Creates a new readiness signal channel starting in the unset state.
pub fn create_signal_channel() -> (SignalTx, SignalRx) {
    let (tx, rx) = watch::channel(None);
    (SignalTx::new(tx), SignalRx(rx))
}
