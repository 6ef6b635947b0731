//! Crate-wide error kinds (spec §7).
//!
//! Mirrors the hand-rolled `Display`/`std::error::Error` shape the rest of
//! this code base uses for storage errors: no `thiserror`, explicit
//! `From` conversions at the boundaries that produce them.

use std::fmt;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The six error kinds from spec §7.
///
/// A single trigger's failure is never fatal to a monitor run. A monitor
/// run's failure is never fatal to the runner. A sweep's failure is logged
/// and the next tick retries — callers are expected to match on `kind()`
/// to decide whether to keep going.
#[derive(Debug)]
pub enum Error {
    /// Invariants on Monitor/Trigger violated (too many triggers, durations
    /// < 1, enabled/enabledTime mismatch). Surfaced to caller as HTTP 400.
    Validation(String),

    /// Caller lacks index or backend-role access. Surfaced as HTTP 403.
    AuthZ(String),

    /// Update against a missing monitor, or a trigger id missing from a
    /// response schema. Surfaced as HTTP 404, or logged and treated as
    /// expired by the sweeper.
    NotFound(String),

    /// The PQL executor returned an error, or a custom fragment was
    /// malformed. Captured per trigger; written as an error alert; other
    /// triggers in the same run still execute.
    QueryFailed(String),

    /// A 429 from a store. Retried under backoff; converted to `Fatal`
    /// after the backoff policy is exhausted.
    Transient(String),

    /// A non-retryable bulk failure, or missing alert collections on
    /// create. Aborts the current run.
    Fatal(String),

    /// The caller's cancellation signal fired during a suspension point
    /// (§5). Aborts the current trigger, not prior durable side effects.
    Cancelled,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Error::QueryFailed(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Error::Fatal(msg.into())
    }

    /// Short tag used in structured log fields and wire-visible error
    /// alerts (never the Debug repr, which is allowed to change shape).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::AuthZ(_) => "authz",
            Error::NotFound(_) => "not_found",
            Error::QueryFailed(_) => "query_failed",
            Error::Transient(_) => "transient",
            Error::Fatal(_) => "fatal",
            Error::Cancelled => "cancelled",
        }
    }

    /// Whether a caller-configured backoff policy should retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "validation failed: {msg}"),
            Error::AuthZ(msg) => write!(f, "not authorized: {msg}"),
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::QueryFailed(msg) => write!(f, "query failed: {msg}"),
            Error::Transient(msg) => write!(f, "transient failure: {msg}"),
            Error::Fatal(msg) => write!(f, "fatal error: {msg}"),
            Error::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::alert_store::StoreError> for Error {
    fn from(err: crate::alert_store::StoreError) -> Self {
        match err {
            crate::alert_store::StoreError::Transient(msg) => Error::Transient(msg),
            crate::alert_store::StoreError::NotFound(msg) => Error::NotFound(msg),
            other => Error::Fatal(other.to_string()),
        }
    }
}
