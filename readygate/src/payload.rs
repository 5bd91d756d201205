//! Dispatch payload types and assembly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{ActionConfig, PlaceholderConfig};
use crate::preferences::PreferenceSnapshot;

/// Whether the downstream invocation waits for the script to finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Queue the script and return immediately.
    #[default]
    FireAndForget,
    /// Block the invocation until the script has completed.
    WaitForCompletion,
}

impl WaitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitPolicy::FireAndForget => "fire_and_forget",
            WaitPolicy::WaitForCompletion => "wait_for_completion",
        }
    }
}

/// The single unit of delivery to the downstream subsystem.
///
/// Built at fire time from the preference snapshot captured when the dispatcher
/// was constructed, and consumed exactly once by the invoker. Variable keys are
/// unique; insertion order carries no meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPayload {
    /// Name of the script the downstream runtime executes.
    pub script: String,
    /// Whether the invocation waits for completion.
    pub wait_policy: WaitPolicy,
    /// Primary parameter passed alongside the script name.
    pub parameter: String,
    /// Variable map merged from the preference snapshot.
    pub variables: HashMap<String, String>,
}

impl DispatchPayload {
    /// Assembles the payload for `action` from the captured snapshot.
    ///
    /// Absent and empty preferences are substituted per `placeholders`, so a
    /// missing key never fails the dispatch.
    pub fn assemble(
        action: &ActionConfig,
        snapshot: &PreferenceSnapshot,
        placeholders: &PlaceholderConfig,
    ) -> Self {
        Self {
            script: action.script.clone(),
            wait_policy: action.wait_policy,
            parameter: action.parameter.clone(),
            variables: snapshot.resolve(placeholders),
        }
    }
}
