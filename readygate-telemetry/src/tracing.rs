//! Tracing subscriber setup.
//!
//! Provides a production initializer driven by `RUST_LOG` and an idempotent
//! test initializer that writes through the test capture writer.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TEST_INIT: Once = Once::new();

/// Default filter applied when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Initializes the global tracing subscriber for production use.
///
/// The filter is taken from the `RUST_LOG` environment variable, falling back
/// to `info` when unset or invalid.
///
/// # Panics
///
/// Panics if a global subscriber was already installed.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();
}

/// Initializes tracing for tests.
///
/// Safe to call from every test; only the first call installs the subscriber.
/// Output goes through the test writer so it is captured per test.
pub fn init_test_tracing() {
    TEST_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
            )
            .with_test_writer()
            .init();
    });
}
