//! One-shot dispatch gated on downstream readiness.
//!
//! [`OneShotDispatcher`] owns the arm/fire/cancel state machine. Construction
//! validates configuration and captures the preference snapshot; [`arm`]
//! spawns a polling task that probes readiness on an interval and delivers
//! exactly one payload when the gate opens, when the optional maximum wait
//! expires under the force-fire policy, or never when cancelled first.
//! State transitions are published through a watch channel so owning contexts
//! can observe the outcome instead of inferring it from the absence of a
//! downstream effect.
//!
//! [`arm`]: OneShotDispatcher::arm

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval};
use tracing::{debug, error, info, warn};

use crate::concurrency::cancel::{CancelRx, CancelTx, create_cancel_channel};
use crate::concurrency::signal::{SignalRx, SignalTx, create_signal_channel};
use crate::concurrency::timer::MaxWaitTimer;
use crate::config::{ActionConfig, DispatcherConfig, ReadinessConfig, TimeoutPolicy};
use crate::error::{ErrorKind, GateResult};
use crate::invoker::ScriptInvoker;
use crate::metrics::{
    DEGRADED_LABEL, DISPATCHER_ID_LABEL, READYGATE_CANCELLATIONS_TOTAL,
    READYGATE_DISPATCHES_TOTAL, READYGATE_DISPATCH_FAILURES_TOTAL, READYGATE_PROBE_TICKS_TOTAL,
    READYGATE_READINESS_TIMEOUTS_TOTAL,
};
use crate::payload::DispatchPayload;
use crate::preferences::{PreferenceSnapshot, PreferencesSource};
use crate::probe::ReadinessProbe;
use crate::{bail, gate_error};

/// Identifier of a dispatcher instance, used in logs and metric labels.
pub type DispatcherId = u64;

/// Arming state of a dispatcher instance.
///
/// Owned exclusively by the dispatcher. `Armed` is the only non-terminal
/// state; once `Fired` or `Cancelled` is reached the instance never leaves it,
/// and a new dispatch requires constructing a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    /// Polling is active; no dispatch has occurred.
    Armed,
    /// The single dispatch attempt has been spent.
    Fired,
    /// The dispatcher was torn down without dispatching.
    Cancelled,
}

impl ArmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArmState::Armed => "armed",
            ArmState::Fired => "fired",
            ArmState::Cancelled => "cancelled",
        }
    }

    /// Returns whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ArmState::Armed)
    }
}

/// How an armed dispatcher concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The payload was delivered and the downstream call succeeded.
    Fired(DispatchReport),
    /// The dispatcher was torn down before readiness; nothing was delivered.
    Cancelled,
}

/// Details of a completed dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    /// Wall-clock time of the dispatch.
    pub fired_at: DateTime<Utc>,
    /// Time spent armed before the dispatch.
    pub waited: Duration,
    /// Whether the dispatch was forced by the maximum-wait policy rather than
    /// observed readiness.
    pub degraded: bool,
}

/// Readiness input for the polling loop, fixed at construction.
///
/// The fixed-delay probe measures from the arming moment, so the probe itself
/// is only built once [`OneShotDispatcher::arm`] runs.
#[derive(Debug, Clone)]
enum ProbeSource {
    FixedDelay(Duration),
    Signal { rx: SignalRx, sentinel: String },
}

impl ProbeSource {
    fn into_probe(self) -> ReadinessProbe {
        match self {
            ProbeSource::FixedDelay(delay) => ReadinessProbe::fixed_delay(delay),
            ProbeSource::Signal { rx, sentinel } => ReadinessProbe::Signal { rx, sentinel },
        }
    }
}

/// Readiness-gated dispatcher delivering one action exactly once.
///
/// The preference snapshot is captured at construction and immutable
/// afterwards; the payload is assembled from it at fire time and consumed
/// exactly once, no matter how many probe ticks observe readiness.
#[derive(Debug)]
pub struct OneShotDispatcher<I> {
    id: DispatcherId,
    config: Arc<DispatcherConfig>,
    action: ActionConfig,
    snapshot: PreferenceSnapshot,
    probe_source: ProbeSource,
    signal_tx: Option<SignalTx>,
    invoker: I,
    cancel_tx: CancelTx,
    cancel_rx: CancelRx,
    state_tx: watch::Sender<ArmState>,
}

impl<I> OneShotDispatcher<I>
where
    I: ScriptInvoker + Send + Sync + 'static,
{
    /// Creates a dispatcher, validating configuration and capturing the
    /// preference snapshot.
    ///
    /// When the signal strategy is configured the dispatcher creates the
    /// readiness channel itself; hand the transmitter from
    /// [`OneShotDispatcher::signal_tx`] to the downstream subsystem so it can
    /// announce readiness.
    pub async fn new<P>(
        id: DispatcherId,
        config: DispatcherConfig,
        action: ActionConfig,
        preferences: &P,
        invoker: I,
    ) -> GateResult<Self>
    where
        P: PreferencesSource,
    {
        config.validate()?;
        action.validate()?;

        let snapshot = PreferenceSnapshot::capture(preferences, &action.preference_keys).await;

        let (probe_source, signal_tx) = match &config.readiness {
            ReadinessConfig::FixedDelay { delay_ms } => {
                (ProbeSource::FixedDelay(Duration::from_millis(*delay_ms)), None)
            }
            ReadinessConfig::Signal { sentinel } => {
                let (signal_tx, signal_rx) = create_signal_channel();
                (
                    ProbeSource::Signal {
                        rx: signal_rx,
                        sentinel: sentinel.clone(),
                    },
                    Some(signal_tx),
                )
            }
        };

        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let (state_tx, _) = watch::channel(ArmState::Armed);

        Ok(Self {
            id,
            config: Arc::new(config),
            action,
            snapshot,
            probe_source,
            signal_tx,
            invoker,
            cancel_tx,
            cancel_rx,
            state_tx,
        })
    }

    /// Returns the dispatcher id.
    pub fn id(&self) -> DispatcherId {
        self.id
    }

    /// Returns the transmitter the downstream subsystem writes its readiness
    /// sentinel to, or [`None`] for the fixed-delay strategy.
    pub fn signal_tx(&self) -> Option<SignalTx> {
        self.signal_tx.clone()
    }

    /// Returns a handle for requesting cancellation.
    pub fn cancel_tx(&self) -> CancelTx {
        self.cancel_tx.clone()
    }

    /// Returns a watch over the arming state.
    ///
    /// The dispatcher's only externally observable symptom of failure would
    /// otherwise be the absence of the downstream effect; watching the state
    /// lets owning contexts react instead.
    pub fn state_rx(&self) -> watch::Receiver<ArmState> {
        self.state_tx.subscribe()
    }

    /// Arms the dispatcher and returns a handle for monitoring it.
    ///
    /// Polling begins immediately on a background task; the caller is never
    /// blocked.
    pub fn arm(self) -> DispatcherHandle {
        let id = self.id;
        let state_rx = self.state_tx.subscribe();
        let join_handle = tokio::spawn(self.run());

        DispatcherHandle {
            id,
            state_rx,
            join_handle,
        }
    }

    /// Polling loop driving the arm/fire/cancel state machine.
    async fn run(self) -> GateResult<DispatchOutcome> {
        let armed_at = Instant::now();
        let probe = self.probe_source.clone().into_probe();

        info!(
            dispatcher_id = self.id,
            strategy = probe.strategy(),
            invoker = I::name(),
            poll_interval_ms = self.config.poll_interval_ms,
            max_wait_ms = self.config.max_wait_ms,
            "arming one-shot dispatcher"
        );

        // The first tick of an interval completes immediately, so a probe that
        // is already satisfied at arm time fires without waiting a full
        // interval.
        let mut poll = interval(self.config.poll_interval());
        let mut max_wait = MaxWaitTimer::new(self.config.max_wait());
        let mut cancel_rx = self.cancel_rx.clone();

        loop {
            tokio::select! {
                biased;

                _ = cancel_rx.wait_for_cancel() => {
                    info!(dispatcher_id = self.id, "cancellation requested, disarming without dispatch");

                    self.update_state(ArmState::Cancelled);
                    counter!(
                        READYGATE_CANCELLATIONS_TOTAL,
                        DISPATCHER_ID_LABEL => self.id.to_string()
                    )
                    .increment(1);

                    return Ok(DispatchOutcome::Cancelled);
                }

                _ = &mut max_wait => {
                    // Readiness arriving exactly at the deadline wins over the
                    // degraded path.
                    if probe.probe().is_ready() {
                        return self.fire(armed_at, false).await;
                    }

                    counter!(
                        READYGATE_READINESS_TIMEOUTS_TOTAL,
                        DISPATCHER_ID_LABEL => self.id.to_string()
                    )
                    .increment(1);

                    match self.config.on_timeout {
                        TimeoutPolicy::ForceFire => {
                            warn!(
                                dispatcher_id = self.id,
                                waited_ms = armed_at.elapsed().as_millis() as u64,
                                "readiness not observed within max wait, force-firing degraded dispatch"
                            );

                            return self.fire(armed_at, true).await;
                        }
                        TimeoutPolicy::CancelAndReport => {
                            warn!(
                                dispatcher_id = self.id,
                                waited_ms = armed_at.elapsed().as_millis() as u64,
                                "readiness not observed within max wait, disarming"
                            );

                            self.update_state(ArmState::Cancelled);

                            bail!(
                                ErrorKind::ReadinessTimeout,
                                "Downstream subsystem never became ready",
                                format!(
                                    "no readiness observed within {} ms",
                                    self.config.max_wait_ms.unwrap_or_default()
                                )
                            );
                        }
                    }
                }

                _ = poll.tick() => {
                    counter!(
                        READYGATE_PROBE_TICKS_TOTAL,
                        DISPATCHER_ID_LABEL => self.id.to_string()
                    )
                    .increment(1);

                    let readiness = probe.probe();
                    if readiness.is_ready() {
                        return self.fire(armed_at, false).await;
                    }

                    debug!(
                        dispatcher_id = self.id,
                        readiness = readiness.as_str(),
                        "downstream subsystem not ready yet"
                    );
                }
            }
        }
    }

    /// Assembles the payload and performs the single delivery attempt.
    ///
    /// The transition to `Fired` happens before the downstream call: the
    /// attempt is spent regardless of how the call turns out, and a failure is
    /// surfaced to the caller rather than retried.
    async fn fire(self, armed_at: Instant, degraded: bool) -> GateResult<DispatchOutcome> {
        let payload =
            DispatchPayload::assemble(&self.action, &self.snapshot, &self.config.placeholders);

        self.update_state(ArmState::Fired);

        let waited = armed_at.elapsed();

        info!(
            dispatcher_id = self.id,
            script = %payload.script,
            waited_ms = waited.as_millis() as u64,
            degraded,
            "dispatching to downstream subsystem"
        );

        let result = self.invoker.invoke(payload).await;

        counter!(
            READYGATE_DISPATCHES_TOTAL,
            DISPATCHER_ID_LABEL => self.id.to_string(),
            DEGRADED_LABEL => degraded.to_string()
        )
        .increment(1);

        match result {
            Ok(()) => Ok(DispatchOutcome::Fired(DispatchReport {
                fired_at: Utc::now(),
                waited,
                degraded,
            })),
            Err(err) => {
                counter!(
                    READYGATE_DISPATCH_FAILURES_TOTAL,
                    DISPATCHER_ID_LABEL => self.id.to_string()
                )
                .increment(1);

                error!(
                    dispatcher_id = self.id,
                    error = %err,
                    "downstream invocation failed, not retrying"
                );

                Err(err)
            }
        }
    }

    /// Publishes a state transition to all watchers.
    fn update_state(&self, state: ArmState) {
        let _ = self.state_tx.send(state);
        debug!(
            dispatcher_id = self.id,
            state = state.as_str(),
            "dispatcher state changed"
        );
    }
}

/// Handle to an armed dispatcher.
///
/// Provides access to the arming state and enables waiting for the final
/// outcome. The state watch remains valid after the dispatcher concludes.
#[derive(Debug)]
pub struct DispatcherHandle {
    id: DispatcherId,
    state_rx: watch::Receiver<ArmState>,
    join_handle: JoinHandle<GateResult<DispatchOutcome>>,
}

impl DispatcherHandle {
    /// Returns the dispatcher id.
    pub fn id(&self) -> DispatcherId {
        self.id
    }

    /// Returns the current arming state.
    pub fn state(&self) -> ArmState {
        *self.state_rx.borrow()
    }

    /// Waits for the dispatcher to conclude and returns the outcome.
    ///
    /// Readiness timeouts under the cancel-and-report policy and downstream
    /// invocation failures are returned as errors; explicit cancellation is a
    /// normal outcome, not an error.
    pub async fn wait(self) -> GateResult<DispatchOutcome> {
        match self.join_handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    dispatcher_id = self.id,
                    error = %err,
                    "dispatcher task terminated abnormally"
                );

                Err(gate_error!(
                    ErrorKind::DispatcherPanic,
                    "Dispatcher task terminated abnormally",
                    err
                ))
            }
        }
    }
}
