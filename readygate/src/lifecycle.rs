//! Host lifecycle event routing.
//!
//! Of the host process's lifecycle events only the launch needs the readiness
//! gate: the downstream runtime is still initializing then, and the launch
//! action goes through [`crate::dispatcher::OneShotDispatcher`]. Every later
//! event finds the runtime long since up, so their actions dispatch directly,
//! best-effort, with no timer in between.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ActionConfig, PlaceholderConfig};
use crate::error::GateResult;
use crate::invoker::ScriptInvoker;
use crate::payload::DispatchPayload;
use crate::preferences::{PreferenceSnapshot, PreferencesSource};

/// Lifecycle events consumed from the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The process finished launching. Gated; not routed here.
    Launched,
    /// The process returned to the foreground.
    BecameActive,
    /// The process is about to move to the background.
    EnteringBackground,
    /// The process is terminating.
    Terminating,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Launched => "launched",
            LifecycleEvent::BecameActive => "became_active",
            LifecycleEvent::EnteringBackground => "entering_background",
            LifecycleEvent::Terminating => "terminating",
        }
    }
}

/// Optional actions for the directly-dispatched lifecycle events.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LifecycleActions {
    /// Action dispatched when the process returns to the foreground.
    #[serde(default)]
    pub on_became_active: Option<ActionConfig>,
    /// Action dispatched when the process moves to the background.
    #[serde(default)]
    pub on_entering_background: Option<ActionConfig>,
    /// Action dispatched when the process terminates.
    #[serde(default)]
    pub on_terminating: Option<ActionConfig>,
}

impl LifecycleActions {
    /// Returns the action configured for `event`.
    ///
    /// [`LifecycleEvent::Launched`] always maps to [`None`]: the launch action
    /// is readiness-gated and owned by the dispatcher.
    fn action_for(&self, event: LifecycleEvent) -> Option<&ActionConfig> {
        match event {
            LifecycleEvent::Launched => None,
            LifecycleEvent::BecameActive => self.on_became_active.as_ref(),
            LifecycleEvent::EnteringBackground => self.on_entering_background.as_ref(),
            LifecycleEvent::Terminating => self.on_terminating.as_ref(),
        }
    }
}

/// Routes host lifecycle events to direct downstream dispatches.
#[derive(Debug, Clone)]
pub struct LifecycleRouter<P, I> {
    actions: LifecycleActions,
    placeholders: PlaceholderConfig,
    preferences: P,
    invoker: I,
}

impl<P, I> LifecycleRouter<P, I>
where
    P: PreferencesSource,
    I: ScriptInvoker,
{
    /// Creates a router over the given actions and collaborators.
    pub fn new(
        actions: LifecycleActions,
        placeholders: PlaceholderConfig,
        preferences: P,
        invoker: I,
    ) -> Self {
        Self {
            actions,
            placeholders,
            preferences,
            invoker,
        }
    }

    /// Handles one lifecycle event.
    ///
    /// Returns whether an action was dispatched. A failed downstream call is
    /// surfaced and not retried; events without a configured action are
    /// ignored.
    pub async fn handle(&self, event: LifecycleEvent) -> GateResult<bool> {
        let Some(action) = self.actions.action_for(event) else {
            debug!(event = event.as_str(), "no action configured for event");
            return Ok(false);
        };

        // Unlike the launch path there is no arming moment to snapshot at, so
        // preferences are captured when the event fires.
        let snapshot =
            PreferenceSnapshot::capture(&self.preferences, &action.preference_keys).await;
        let payload = DispatchPayload::assemble(action, &snapshot, &self.placeholders);

        info!(
            event = event.as_str(),
            script = %payload.script,
            "dispatching lifecycle action"
        );

        self.invoker.invoke(payload).await?;

        Ok(true)
    }
}
