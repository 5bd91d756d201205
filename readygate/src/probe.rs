//! Readiness probing for the downstream subsystem.

use std::time::Duration;
use tokio::time::Instant;

use crate::concurrency::signal::SignalRx;

/// Whether the downstream subsystem can accept requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// The downstream subsystem is still initializing.
    NotReady,
    /// The downstream subsystem can accept requests.
    Ready,
}

impl ReadinessState {
    /// Returns whether this state is [`ReadinessState::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessState::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessState::NotReady => "not_ready",
            ReadinessState::Ready => "ready",
        }
    }
}

/// Strategy answering whether the downstream subsystem is ready.
///
/// [`ReadinessProbe::probe`] is non-blocking, side-effect free, and callable
/// repeatedly. The dispatcher acts on the first `Ready` it observes, so a
/// signal slot overwritten after that observation never reverts a fired
/// dispatch.
#[derive(Debug, Clone)]
pub enum ReadinessProbe {
    /// Ready once the configured delay has elapsed since arming.
    ///
    /// No failure mode, but the delay is an empirical guess: too short and the
    /// downstream call lands before the subsystem can take it, too long and
    /// user-visible behavior is delayed for nothing.
    FixedDelay {
        /// Moment the dispatcher was armed.
        armed_at: Instant,
        /// Delay after which the downstream subsystem is assumed ready.
        delay: Duration,
    },
    /// Ready once the signal channel holds the designated sentinel.
    Signal {
        /// Receiver side of the readiness signal channel.
        rx: SignalRx,
        /// Value the downstream subsystem writes to announce readiness.
        sentinel: String,
    },
}

impl ReadinessProbe {
    /// Creates a fixed-delay probe armed now.
    pub fn fixed_delay(delay: Duration) -> Self {
        ReadinessProbe::FixedDelay {
            armed_at: Instant::now(),
            delay,
        }
    }

    /// Creates a signal-polled probe matching `sentinel` against the channel.
    pub fn signal(rx: SignalRx, sentinel: impl Into<String>) -> Self {
        ReadinessProbe::Signal {
            rx,
            sentinel: sentinel.into(),
        }
    }

    /// Returns the current readiness of the downstream subsystem.
    pub fn probe(&self) -> ReadinessState {
        match self {
            ReadinessProbe::FixedDelay { armed_at, delay } => {
                if armed_at.elapsed() >= *delay {
                    ReadinessState::Ready
                } else {
                    ReadinessState::NotReady
                }
            }
            ReadinessProbe::Signal { rx, sentinel } => {
                if rx.matches(sentinel) {
                    ReadinessState::Ready
                } else {
                    ReadinessState::NotReady
                }
            }
        }
    }

    /// Returns the strategy name for logging.
    pub fn strategy(&self) -> &'static str {
        match self {
            ReadinessProbe::FixedDelay { .. } => "fixed_delay",
            ReadinessProbe::Signal { .. } => "signal",
        }
    }
}
