use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::GateResult;
use crate::invoker::ScriptInvoker;
use crate::payload::DispatchPayload;

/// In-memory invoker for testing and development purposes.
///
/// [`MemoryInvoker`] records every payload it receives instead of driving a
/// real runtime, so callers can inspect exactly what would have been queued.
#[derive(Debug, Clone, Default)]
pub struct MemoryInvoker {
    inner: Arc<Mutex<Vec<DispatchPayload>>>,
}

impl MemoryInvoker {
    /// Creates a new empty memory invoker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded payloads.
    pub async fn invocations(&self) -> Vec<DispatchPayload> {
        let inner = self.inner.lock().await;
        inner.clone()
    }

    /// Clears all recorded payloads.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.clear();
    }
}

impl ScriptInvoker for MemoryInvoker {
    fn name() -> &'static str {
        "memory"
    }

    async fn invoke(&self, payload: DispatchPayload) -> GateResult<()> {
        let mut inner = self.inner.lock().await;

        info!(
            script = %payload.script,
            wait_policy = payload.wait_policy.as_str(),
            variables = payload.variables.len(),
            "recording invocation"
        );
        inner.push(payload);

        Ok(())
    }
}
