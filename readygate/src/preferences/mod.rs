//! Native preference access for payload assembly.
//!
//! This module provides the [`PreferencesSource`] trait over the host's
//! settings store and the [`PreferenceSnapshot`] captured from it before
//! dispatch. A snapshot reads each requested key exactly once and is immutable
//! afterwards: later changes to the store never leak into an already-armed
//! dispatcher.

mod base;
pub mod memory;

pub use base::{PreferenceSnapshot, PreferenceValue, PreferencesSource};
