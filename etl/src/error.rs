//! Error types and result definitions for sync operations.
//!
//! Every fallible operation of the loaders returns [`EtlResult`]. An [`EtlError`]
//! carries a classification ([`ErrorKind`]) that tells the orchestrator whether
//! the failure is transient, a poisoned payload or a rejected write, together
//! with the call site that produced it.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for sync operations using [`EtlError`] as the error type.
pub type EtlResult<T> = Result<T, EtlError>;

/// Specific categories of errors that can occur while syncing.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Transient I/O, the next scheduled run retries from the saved watermark.
    StoreIoError,
    UpstreamIoError,

    // Query & write errors
    StoreQueryFailed,
    WatermarkStoreFailed,
    ConstraintViolation,
    UpstreamRequestFailed,

    // Payload errors, the record is retried identically on every run.
    InvalidPayload,
    DeserializationError,
    SerializationError,

    // Configuration & state
    ConfigError,
    InvalidState,

    Unknown,

    /// Raised by fail points to simulate a crash in tests.
    #[cfg(feature = "failpoints")]
    InjectedFault,
}

impl ErrorKind {
    /// Returns `true` for failures caused by an unavailable store or network,
    /// which resolve by themselves on a later run.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::StoreIoError | ErrorKind::UpstreamIoError)
    }
}

/// Main error type for sync operations.
#[derive(Debug, Clone)]
pub struct EtlError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the dynamic detail attached to the error, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the callsite that created this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches the originating error, exposed through [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        EtlError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
        }
    }
}

impl PartialEq for EtlError {
    fn eq(&self, other: &EtlError) -> bool {
        self.kind == other.kind && self.description == other.description
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} @ {}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line()
        )?;

        if let Some(detail) = &self.detail {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for EtlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

/// Creates an [`EtlError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for EtlError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`EtlError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for EtlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// SQLSTATE class of integrity constraint violations.
const INTEGRITY_CONSTRAINT_VIOLATION_CLASS: &str = "23";

/// Converts [`sqlx::Error`] to [`EtlError`].
///
/// Integrity violations (SQLSTATE `23xxx`) map to [`ErrorKind::ConstraintViolation`],
/// connectivity problems to [`ErrorKind::StoreIoError`] and everything else to
/// [`ErrorKind::StoreQueryFailed`].
impl From<sqlx::Error> for EtlError {
    #[track_caller]
    fn from(err: sqlx::Error) -> EtlError {
        let (kind, description) = match &err {
            sqlx::Error::Database(db_err)
                if db_err
                    .code()
                    .is_some_and(|code| code.starts_with(INTEGRITY_CONSTRAINT_VIOLATION_CLASS)) =>
            {
                (
                    ErrorKind::ConstraintViolation,
                    "Warehouse rejected the write",
                )
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed => (ErrorKind::StoreIoError, "Warehouse is unavailable"),
            _ => (ErrorKind::StoreQueryFailed, "Warehouse query failed"),
        };

        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`reqwest::Error`] to [`EtlError`].
///
/// Timeouts and connection failures are transient, anything else means the
/// API answered with something we can't use.
impl From<reqwest::Error> for EtlError {
    #[track_caller]
    fn from(err: reqwest::Error) -> EtlError {
        let (kind, description) = if err.is_timeout() || err.is_connect() || err.is_request() {
            (ErrorKind::UpstreamIoError, "Upstream API is unavailable")
        } else if err.is_decode() {
            (
                ErrorKind::DeserializationError,
                "Upstream API returned an undecodable page",
            )
        } else {
            (ErrorKind::UpstreamRequestFailed, "Upstream API request failed")
        };

        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`EtlError`].
impl From<serde_json::Error> for EtlError {
    #[track_caller]
    fn from(err: serde_json::Error) -> EtlError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => {
                (ErrorKind::SerializationError, "JSON I/O operation failed")
            }
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => {
                (ErrorKind::DeserializationError, "JSON deserialization failed")
            }
        };

        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`chrono::ParseError`] to [`EtlError`] with [`ErrorKind::InvalidPayload`].
impl From<chrono::ParseError> for EtlError {
    #[track_caller]
    fn from(err: chrono::ParseError) -> EtlError {
        let detail = err.to_string();
        EtlError::from_components(
            ErrorKind::InvalidPayload,
            Cow::Borrowed("Timestamp parsing failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
