use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::preferences::PreferencesSource;

/// In-memory preference store for testing and development purposes.
///
/// [`MemoryPreferences`] holds key/value pairs in memory. A key that was never
/// [`MemoryPreferences::set`] reads as absent; setting an empty string keeps
/// the key present-but-empty, matching how a native settings store behaves.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPreferences {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, overwriting any previous value.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.insert(key.into(), value.into());
    }

    /// Removes `key`, making it read as absent again.
    pub async fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.remove(key);
    }
}

impl PreferencesSource for MemoryPreferences {
    fn name() -> &'static str {
        "memory"
    }

    async fn read(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.get(key).cloned()
    }
}
