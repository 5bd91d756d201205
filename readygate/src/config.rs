//! Configuration for readiness-gated dispatch.
//!
//! All structs deserialize with serde and supply defaults per field, so partial
//! configuration files stay valid as new knobs are added. [`DispatcherConfig`]
//! is validated once at dispatcher construction; validation failures convert
//! into [`crate::error::GateError`] with a config error kind.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::payload::WaitPolicy;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Polling cannot be disabled by zeroing the interval.
    #[error("`poll_interval_ms` cannot be zero")]
    PollIntervalZero,
    /// A configured maximum wait must be a positive duration.
    #[error("`max_wait_ms` cannot be zero when set")]
    MaxWaitZero,
    /// The signal strategy needs a designated ready value to match against.
    #[error("signal readiness requires a non-empty `sentinel`")]
    EmptySentinel,
    /// An action must name the downstream script it runs.
    #[error("`script` cannot be empty")]
    EmptyScript,
}

/// Strategy used to decide when the downstream subsystem is ready.
///
/// The fixed delay is an empirical guess tied to the deployment target; prefer
/// the signal strategy whenever the downstream subsystem can be made to write
/// a sentinel, and bound it with [`DispatcherConfig::max_wait_ms`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum ReadinessConfig {
    /// Ready once the configured delay has elapsed since arming.
    FixedDelay {
        /// Delay in milliseconds measured from the moment the dispatcher is armed.
        #[serde(default)]
        delay_ms: u64,
    },
    /// Ready once the signal channel holds the designated sentinel value.
    Signal {
        /// Value the downstream subsystem writes to announce readiness.
        sentinel: String,
    },
}

/// What to do when readiness is not observed within the maximum wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Dispatch anyway and mark the report as degraded.
    ForceFire,
    /// Disarm without dispatching and report a readiness timeout.
    CancelAndReport,
}

/// Substitutions applied when a snapshotted preference is absent or empty.
///
/// The two cases stay distinguishable end to end: an absent key and a
/// present-but-empty value each get their own replacement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    /// Value substituted when a requested key is absent from the source.
    #[serde(default = "default_on_missing")]
    pub on_missing: String,
    /// Value substituted when the source returns an empty string.
    #[serde(default = "default_on_empty")]
    pub on_empty: String,
}

impl PlaceholderConfig {
    /// Default substitution for absent keys.
    pub const DEFAULT_ON_MISSING: &'static str = "<invalid>";

    /// Default substitution for present-but-empty values.
    pub const DEFAULT_ON_EMPTY: &'static str = "";
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            on_missing: default_on_missing(),
            on_empty: default_on_empty(),
        }
    }
}

fn default_on_missing() -> String {
    PlaceholderConfig::DEFAULT_ON_MISSING.to_string()
}

fn default_on_empty() -> String {
    PlaceholderConfig::DEFAULT_ON_EMPTY.to_string()
}

/// A named downstream action together with the preference keys captured for
/// its payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Name of the script the downstream runtime executes.
    pub script: String,
    /// Whether the invocation waits for completion or fires and forgets.
    #[serde(default)]
    pub wait_policy: WaitPolicy,
    /// Primary parameter passed alongside the script name.
    #[serde(default)]
    pub parameter: String,
    /// Preference keys snapshotted into the payload's variable map.
    #[serde(default)]
    pub preference_keys: Vec<String>,
}

impl ActionConfig {
    /// Creates an action with no parameter and no captured preferences.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            wait_policy: WaitPolicy::default(),
            parameter: String::new(),
            preference_keys: Vec::new(),
        }
    }

    /// Validates the action configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.script.is_empty() {
            return Err(ValidationError::EmptyScript);
        }

        Ok(())
    }
}

/// Configuration for a one-shot dispatcher instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Interval in milliseconds between readiness probes.
    ///
    /// Default: 500.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Strategy used to detect downstream readiness.
    pub readiness: ReadinessConfig,

    /// Optional upper bound, in milliseconds, on how long readiness is awaited.
    ///
    /// When unset the dispatcher waits until readiness or cancellation.
    #[serde(default)]
    pub max_wait_ms: Option<u64>,

    /// Policy applied when the maximum wait expires.
    ///
    /// Default: force-fire a degraded dispatch.
    #[serde(default = "default_on_timeout")]
    pub on_timeout: TimeoutPolicy,

    /// Substitutions for absent and empty preferences.
    #[serde(default)]
    pub placeholders: PlaceholderConfig,
}

impl DispatcherConfig {
    /// Default probe interval: half a time unit.
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

    /// Returns the probe interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the maximum wait as a [`Duration`], if configured.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    /// Validates the dispatcher configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::PollIntervalZero);
        }

        if self.max_wait_ms == Some(0) {
            return Err(ValidationError::MaxWaitZero);
        }

        if let ReadinessConfig::Signal { sentinel } = &self.readiness
            && sentinel.is_empty()
        {
            return Err(ValidationError::EmptySentinel);
        }

        Ok(())
    }
}

fn default_poll_interval_ms() -> u64 {
    DispatcherConfig::DEFAULT_POLL_INTERVAL_MS
}

fn default_on_timeout() -> TimeoutPolicy {
    TimeoutPolicy::ForceFire
}
