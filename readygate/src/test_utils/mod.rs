//! Test utilities for exercising dispatchers without a real downstream runtime.

pub mod invoker;
pub mod notify;
