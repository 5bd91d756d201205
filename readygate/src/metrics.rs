//! Metrics definitions for dispatcher monitoring.

/// Label for dispatcher ID in metrics.
pub const DISPATCHER_ID_LABEL: &str = "dispatcher_id";

/// Label distinguishing degraded (force-fired) dispatches.
pub const DEGRADED_LABEL: &str = "degraded";

/// Counter for readiness probe ticks.
pub const READYGATE_PROBE_TICKS_TOTAL: &str = "readygate_probe_ticks_total";

/// Counter for completed dispatches.
pub const READYGATE_DISPATCHES_TOTAL: &str = "readygate_dispatches_total";

/// Counter for failed downstream invocations.
pub const READYGATE_DISPATCH_FAILURES_TOTAL: &str = "readygate_dispatch_failures_total";

/// Counter for readiness timeouts.
pub const READYGATE_READINESS_TIMEOUTS_TOTAL: &str = "readygate_readiness_timeouts_total";

/// Counter for cancellations.
pub const READYGATE_CANCELLATIONS_TOTAL: &str = "readygate_cancellations_total";
