//! Error types and result definitions for readiness-gated dispatch.
//!
//! Provides a single error type with classification and captured callsite metadata.
//! [`GateError`] carries an [`ErrorKind`], a static description, optional dynamic
//! detail, and an optional source error, so callers can match on the failure class
//! while logs keep the full story.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::config::ValidationError;

/// Convenient result type using [`GateError`] as the error type.
pub type GateResult<T> = Result<T, GateError>;

/// Main error type for dispatch operations.
///
/// All public operations of this crate return failures as [`GateError`] values;
/// nothing is thrown as an uncatchable fault. The error records the callsite of
/// its construction for diagnostics.
#[derive(Debug, Clone)]
pub struct GateError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Specific categories of errors that can occur during dispatch.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The downstream subsystem never reported readiness within the configured
    /// maximum wait, under the cancel-and-report timeout policy.
    ReadinessTimeout,
    /// The downstream invocation reported failure. The dispatch attempt is
    /// spent; the dispatcher does not retry.
    DispatchFailed,
    /// An operation was attempted from a state that does not permit it.
    InvalidState,
    /// The dispatcher configuration failed validation.
    ConfigError,
    /// The dispatcher task terminated abnormally.
    DispatcherPanic,
    /// Unknown / uncategorized.
    Unknown,
}

impl GateError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the
    /// modified instance. The stored source is preserved across clones and
    /// exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`GateError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        GateError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
        }
    }
}

impl PartialEq for GateError {
    /// Two errors are considered equal when they share the same kind; detail,
    /// source, and location are diagnostic data, not identity.
    fn eq(&self, other: &GateError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = self.detail.as_deref() {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for GateError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates a [`GateError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for GateError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> GateError {
        GateError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`GateError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for GateError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> GateError {
        GateError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts configuration validation failures to [`GateError`] with
/// [`ErrorKind::ConfigError`].
impl From<ValidationError> for GateError {
    #[track_caller]
    fn from(err: ValidationError) -> GateError {
        let detail = err.to_string();
        let source = Arc::new(err);
        GateError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid dispatcher configuration"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}
