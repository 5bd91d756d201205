use std::collections::HashMap;
use std::future::Future;

use tracing::debug;

use crate::config::PlaceholderConfig;

/// A preference value with the three-way distinction preserved.
///
/// The host settings store distinguishes a key that was never written from a
/// key holding an empty string; both differ from a real value. Collapsing the
/// three cases early would make the placeholder substitution ambiguous, so the
/// distinction is carried until payload assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceValue {
    /// The key is absent from the source.
    Missing,
    /// The key is present and holds an empty string.
    Empty,
    /// The key is present and holds a non-empty string.
    Value(String),
}

impl PreferenceValue {
    /// Classifies a raw read result.
    pub fn from_read(read: Option<String>) -> Self {
        match read {
            None => PreferenceValue::Missing,
            Some(value) if value.is_empty() => PreferenceValue::Empty,
            Some(value) => PreferenceValue::Value(value),
        }
    }

    /// Returns whether the key was absent from the source.
    pub fn is_missing(&self) -> bool {
        matches!(self, PreferenceValue::Missing)
    }

    /// Resolves this value to the string placed into the payload,
    /// substituting the configured placeholders for the absent and empty cases.
    pub fn resolve(&self, placeholders: &PlaceholderConfig) -> String {
        match self {
            PreferenceValue::Missing => placeholders.on_missing.clone(),
            PreferenceValue::Empty => placeholders.on_empty.clone(),
            PreferenceValue::Value(value) => value.clone(),
        }
    }
}

/// Trait for read-only access to the host's preference store.
///
/// Implementations adapt a native settings facility. Values are opaque strings;
/// interpretation belongs to the downstream script. The core calls
/// [`PreferencesSource::read`] once per key at snapshot time and never writes.
pub trait PreferencesSource {
    /// Returns the name of the source.
    fn name() -> &'static str;

    /// Reads a single key.
    ///
    /// Returns [`None`] when the key is absent, `Some("")` when the key is
    /// present but empty. Implementations must keep the two apart.
    fn read(&self, key: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Immutable set of preference values captured before dispatch.
#[derive(Debug, Clone, Default)]
pub struct PreferenceSnapshot {
    values: HashMap<String, PreferenceValue>,
}

impl PreferenceSnapshot {
    /// Captures the given keys from `source`, reading each exactly once.
    pub async fn capture<P>(source: &P, keys: &[String]) -> Self
    where
        P: PreferencesSource,
    {
        let mut values = HashMap::with_capacity(keys.len());

        for key in keys {
            let value = PreferenceValue::from_read(source.read(key).await);

            // Keys are logged, values are not: preference stores routinely
            // hold credentials.
            debug!(source = P::name(), key = %key, missing = value.is_missing(), "captured preference");

            values.insert(key.clone(), value);
        }

        Self { values }
    }

    /// Returns the captured value for `key`, if it was requested.
    pub fn get(&self, key: &str) -> Option<&PreferenceValue> {
        self.values.get(key)
    }

    /// Returns the number of captured keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no keys were captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Produces the payload variable map, substituting placeholders for the
    /// absent and empty cases.
    pub fn resolve(&self, placeholders: &PlaceholderConfig) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.resolve(placeholders)))
            .collect()
    }
}
