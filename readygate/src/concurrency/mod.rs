//! Concurrency primitives for coordinating the dispatcher with the downstream
//! subsystem and its owning context.
//!
//! The [`signal`] module carries the readiness announcement from the downstream
//! subsystem to the probe; the [`cancel`] module lets the owning lifecycle tear
//! a dispatcher down from any state; the [`timer`] module bounds how long
//! readiness is awaited. All three are watch/timer wrappers kept deliberately
//! small so the dispatcher's select loop stays readable.

pub mod cancel;
pub mod signal;
pub mod timer;
