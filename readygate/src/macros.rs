//! Macros for dispatch error handling.

/// Creates a [`crate::error::GateError`] from an error kind and description.
///
/// Accepts an optional dynamic detail (converted with `to_string`) and an
/// optional source error.
#[macro_export]
macro_rules! gate_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::GateError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::GateError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::GateError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::GateError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::GateError`] from the current function.
///
/// Combines error creation with early return for conditions that terminate the
/// surrounding operation. Supports the same arguments as [`gate_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::gate_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::gate_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::gate_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::gate_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
