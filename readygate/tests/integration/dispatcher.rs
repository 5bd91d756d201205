use std::time::Duration;

use rand::random;
use readygate::config::{
    ActionConfig, DispatcherConfig, PlaceholderConfig, ReadinessConfig, TimeoutPolicy,
};
use readygate::dispatcher::{ArmState, DispatchOutcome, DispatcherId, OneShotDispatcher};
use readygate::error::ErrorKind;
use readygate::preferences::memory::MemoryPreferences;
use readygate::test_utils::invoker::NotifyingInvoker;
use readygate_telemetry::tracing::init_test_tracing;
use tokio::time::{Instant, advance};

const POLL_INTERVAL_MS: u64 = 500;

fn fixed_delay_config(delay_ms: u64) -> DispatcherConfig {
    DispatcherConfig {
        poll_interval_ms: POLL_INTERVAL_MS,
        readiness: ReadinessConfig::FixedDelay { delay_ms },
        max_wait_ms: None,
        on_timeout: TimeoutPolicy::ForceFire,
        placeholders: PlaceholderConfig::default(),
    }
}

fn signal_config(sentinel: &str) -> DispatcherConfig {
    DispatcherConfig {
        poll_interval_ms: POLL_INTERVAL_MS,
        readiness: ReadinessConfig::Signal {
            sentinel: sentinel.to_string(),
        },
        max_wait_ms: None,
        on_timeout: TimeoutPolicy::ForceFire,
        placeholders: PlaceholderConfig::default(),
    }
}

fn startup_action() -> ActionConfig {
    ActionConfig::new("on_startup")
}

/// Lets the spawned dispatcher task process any due ticks before asserting.
async fn yield_to_dispatcher() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_dispatcher_fires_exactly_once_at_delay() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();
    let id: DispatcherId = random();

    let dispatcher = OneShotDispatcher::new(
        id,
        fixed_delay_config(2_000),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let started = Instant::now();
    let outcome = dispatcher.arm().wait().await.unwrap();

    let DispatchOutcome::Fired(report) = outcome else {
        panic!("expected a fired outcome, got {outcome:?}");
    };
    assert!(!report.degraded);

    // Never before the delay, and on the tick grid right at it.
    assert!(started.elapsed() >= Duration::from_millis(2_000));
    assert!(started.elapsed() < Duration::from_millis(2_000 + POLL_INTERVAL_MS));

    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_dispatcher_stays_armed_until_delay_elapses() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let dispatcher = OneShotDispatcher::new(
        random(),
        fixed_delay_config(2_000),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let handle = dispatcher.arm();

    // Armed through t = 0, 0.5, 1.0, 1.5.
    yield_to_dispatcher().await;
    assert_eq!(handle.state(), ArmState::Armed);
    for _ in 0..3 {
        advance(Duration::from_millis(POLL_INTERVAL_MS)).await;
        yield_to_dispatcher().await;
        assert_eq!(handle.state(), ArmState::Armed);
        assert_eq!(invoker.invocation_count().await, 0);
    }

    // Fired exactly once at t = 2.0.
    advance(Duration::from_millis(POLL_INTERVAL_MS)).await;
    let outcome = handle.wait().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Fired(_)));
    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn probe_ready_at_arm_time_fires_on_first_tick() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let dispatcher = OneShotDispatcher::new(
        random(),
        fixed_delay_config(0),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let started = Instant::now();
    let outcome = dispatcher.arm().wait().await.unwrap();

    assert!(matches!(outcome, DispatchOutcome::Fired(_)));
    // No full poll interval was waited.
    assert!(started.elapsed() < Duration::from_millis(POLL_INTERVAL_MS));
    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn signal_dispatcher_fires_when_sentinel_announced() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let dispatcher = OneShotDispatcher::new(
        random(),
        signal_config("ready-token"),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let signal_tx = dispatcher.signal_tx().unwrap();
    let handle = dispatcher.arm();

    // Unset channel: armed across ticks.
    yield_to_dispatcher().await;
    advance(Duration::from_millis(POLL_INTERVAL_MS)).await;
    yield_to_dispatcher().await;
    assert_eq!(handle.state(), ArmState::Armed);

    // A non-sentinel value does not open the gate.
    signal_tx.announce("warming-up");
    advance(Duration::from_millis(POLL_INTERVAL_MS)).await;
    yield_to_dispatcher().await;
    assert_eq!(handle.state(), ArmState::Armed);
    assert_eq!(invoker.invocation_count().await, 0);

    // The sentinel does, on the next tick.
    signal_tx.announce("ready-token");
    let outcome = handle.wait().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Fired(_)));
    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn signal_dispatcher_ignores_writes_after_firing() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let dispatcher = OneShotDispatcher::new(
        random(),
        signal_config("ready-token"),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let signal_tx = dispatcher.signal_tx().unwrap();
    signal_tx.announce("ready-token");

    let handle = dispatcher.arm();
    let fired = invoker.wait_for_invocations(1).await;
    let outcome = handle.wait().await.unwrap();
    fired.notified().await;
    assert!(matches!(outcome, DispatchOutcome::Fired(_)));

    // Writes after firing have no effect on this instance.
    signal_tx.announce("ready-token");
    signal_tx.clear();
    signal_tx.announce("ready-token");
    yield_to_dispatcher().await;

    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_fire_prevents_dispatch() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let dispatcher = OneShotDispatcher::new(
        random(),
        signal_config("ready-token"),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let cancel_tx = dispatcher.cancel_tx();
    let handle = dispatcher.arm();

    yield_to_dispatcher().await;
    cancel_tx.cancel();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Cancelled);
    assert_eq!(invoker.invocation_count().await, 0);

    // Cancelling an already-cancelled dispatcher is a no-op.
    cancel_tx.cancel();
}

#[tokio::test(start_paused = true)]
async fn cancel_after_fire_is_a_noop() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let dispatcher = OneShotDispatcher::new(
        random(),
        fixed_delay_config(0),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let cancel_tx = dispatcher.cancel_tx();
    let state_rx = dispatcher.state_rx();

    let outcome = dispatcher.arm().wait().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Fired(_)));

    cancel_tx.cancel();
    yield_to_dispatcher().await;

    // The fired state is terminal and the single dispatch stands.
    assert_eq!(*state_rx.borrow(), ArmState::Fired);
    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn max_wait_with_cancel_policy_reports_timeout() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let config = DispatcherConfig {
        max_wait_ms: Some(3_000),
        on_timeout: TimeoutPolicy::CancelAndReport,
        ..signal_config("ready-token")
    };

    let dispatcher = OneShotDispatcher::new(
        random(),
        config,
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let state_rx = dispatcher.state_rx();
    let err = dispatcher.arm().wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ReadinessTimeout);
    assert_eq!(*state_rx.borrow(), ArmState::Cancelled);
    assert_eq!(invoker.invocation_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn max_wait_with_force_fire_policy_dispatches_degraded() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let config = DispatcherConfig {
        max_wait_ms: Some(3_000),
        on_timeout: TimeoutPolicy::ForceFire,
        ..signal_config("ready-token")
    };

    let dispatcher = OneShotDispatcher::new(
        random(),
        config,
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let started = Instant::now();
    let outcome = dispatcher.arm().wait().await.unwrap();

    let DispatchOutcome::Fired(report) = outcome else {
        panic!("expected a degraded fired outcome, got {outcome:?}");
    };
    assert!(report.degraded);
    assert!(started.elapsed() >= Duration::from_millis(3_000));
    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn downstream_failure_leaves_dispatcher_fired() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();
    invoker.set_failing(true).await;

    let dispatcher = OneShotDispatcher::new(
        random(),
        fixed_delay_config(0),
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap();

    let state_rx = dispatcher.state_rx();
    let err = dispatcher.arm().wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DispatchFailed);
    // The attempt is spent; no retry happens and the state is Fired.
    assert_eq!(*state_rx.borrow(), ArmState::Fired);
    assert_eq!(invoker.invocation_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn payload_uses_snapshot_with_configured_placeholders() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    preferences.set("username", "alice").await;
    preferences.set("datasource", "").await;

    let invoker = NotifyingInvoker::new();

    let config = DispatcherConfig {
        placeholders: PlaceholderConfig {
            on_missing: String::new(),
            on_empty: "<invalid>".to_string(),
        },
        ..fixed_delay_config(1_000)
    };

    let action = ActionConfig {
        preference_keys: vec![
            "username".to_string(),
            "password".to_string(),
            "datasource".to_string(),
        ],
        ..startup_action()
    };

    let dispatcher =
        OneShotDispatcher::new(random(), config, action, &preferences, invoker.clone())
            .await
            .unwrap();

    // The snapshot was taken at construction; later store changes must not
    // leak into the payload.
    preferences.set("username", "mallory").await;

    let outcome = dispatcher.arm().wait().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Fired(_)));

    let payloads = invoker.payloads().await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].script, "on_startup");
    assert_eq!(payloads[0].variables["username"], "alice");
    assert_eq!(payloads[0].variables["password"], "");
    assert_eq!(payloads[0].variables["datasource"], "<invalid>");
}

#[tokio::test]
async fn invalid_configuration_is_rejected_at_construction() {
    init_test_tracing();

    let preferences = MemoryPreferences::new();
    let invoker = NotifyingInvoker::new();

    let config = DispatcherConfig {
        poll_interval_ms: 0,
        ..fixed_delay_config(1_000)
    };

    let err = OneShotDispatcher::new(
        random(),
        config,
        startup_action(),
        &preferences,
        invoker.clone(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}
