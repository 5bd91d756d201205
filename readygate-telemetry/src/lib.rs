//! Telemetry initialization shared by readygate binaries and tests.

pub mod tracing;
