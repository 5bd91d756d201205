//! Downstream action invocation.
//!
//! The [`ScriptInvoker`] trait is the seam to the opaque, asynchronously
//! initializing runtime that ultimately executes a named action. This crate
//! never looks inside it: readiness is established beforehand by the probe,
//! and a failed invocation is surfaced, not retried.

mod base;
pub mod memory;

pub use base::ScriptInvoker;
