use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::error::{ErrorKind, GateResult};
use crate::gate_error;
use crate::invoker::ScriptInvoker;
use crate::payload::DispatchPayload;
use crate::test_utils::notify::TimedNotify;

#[derive(Debug)]
struct Waiter {
    target: usize,
    notify: Arc<Notify>,
}

#[derive(Debug, Default)]
struct Inner {
    payloads: Vec<DispatchPayload>,
    failing: bool,
    waiters: Vec<Waiter>,
}

/// Recording invoker that wakes waiters when invocation counts are reached.
///
/// Payloads are recorded even when the invoker is configured to fail, so tests
/// can assert both that the attempt happened and that the failure surfaced.
#[derive(Debug, Clone, Default)]
pub struct NotifyingInvoker {
    inner: Arc<Mutex<Inner>>,
}

impl NotifyingInvoker {
    /// Creates a new invoker with no recorded payloads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent invocations report failure.
    pub async fn set_failing(&self, failing: bool) {
        let mut inner = self.inner.lock().await;
        inner.failing = failing;
    }

    /// Returns a copy of all recorded payloads.
    pub async fn payloads(&self) -> Vec<DispatchPayload> {
        let inner = self.inner.lock().await;
        inner.payloads.clone()
    }

    /// Returns the number of recorded invocations.
    pub async fn invocation_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.payloads.len()
    }

    /// Returns a notification that fires once `count` invocations were
    /// recorded. Resolves immediately when the count was already reached.
    pub async fn wait_for_invocations(&self, count: usize) -> TimedNotify {
        let mut inner = self.inner.lock().await;

        let notify = Arc::new(Notify::new());
        if inner.payloads.len() >= count {
            // Store a permit so the upcoming wait resolves immediately.
            notify.notify_one();
        } else {
            inner.waiters.push(Waiter {
                target: count,
                notify: notify.clone(),
            });
        }

        TimedNotify::new(notify)
    }
}

impl ScriptInvoker for NotifyingInvoker {
    fn name() -> &'static str {
        "notifying"
    }

    async fn invoke(&self, payload: DispatchPayload) -> GateResult<()> {
        let mut inner = self.inner.lock().await;

        inner.payloads.push(payload);

        let count = inner.payloads.len();
        inner.waiters.retain(|waiter| {
            if count >= waiter.target {
                waiter.notify.notify_one();
                false
            } else {
                true
            }
        });

        if inner.failing {
            return Err(gate_error!(
                ErrorKind::DispatchFailed,
                "Downstream invocation reported failure",
                "invoker configured to fail"
            ));
        }

        Ok(())
    }
}
