use std::future::Future;

use crate::error::GateResult;
use crate::payload::DispatchPayload;

/// Trait for the downstream runtime that executes named actions.
///
/// Implementations adapt the embedded runtime's invocation entry point. The
/// dispatcher delivers exactly one payload per armed instance; an error return
/// marks the attempt as failed but spent. Retry policy, if any, belongs to the
/// caller via a new dispatcher instance.
pub trait ScriptInvoker {
    /// Returns the name of the invoker.
    fn name() -> &'static str;

    /// Delivers one action invocation to the downstream runtime.
    ///
    /// Whether the call blocks until the script completes is governed by the
    /// payload's wait policy; from this crate's perspective the runtime's
    /// internal asynchrony is opaque.
    fn invoke(&self, payload: DispatchPayload) -> impl Future<Output = GateResult<()>> + Send;
}
