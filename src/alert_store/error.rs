//! Error types for alert/monitor persistence, grounded in the hub's
//! `storage::error` shape: a hand-rolled enum, no `thiserror`, explicit
//! `From` conversions at the one crate boundary (`sqlx`) that produces
//! errors we didn't author.

use std::fmt;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    ConnectionFailed(String),
    QueryFailed(String),
    MigrationFailed(String),
    SerializationError(String),

    /// A 429-equivalent: the backend asked the caller to back off. The
    /// only variant [`crate::error::Error`] maps to `Transient` (spec §7).
    Transient(String),

    /// No document with that id. Maps to `Error::NotFound` (spec §7).
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ConnectionFailed(msg) => write!(f, "failed to connect to alert store: {msg}"),
            StoreError::QueryFailed(msg) => write!(f, "alert store query failed: {msg}"),
            StoreError::MigrationFailed(msg) => write!(f, "alert store migration failed: {msg}"),
            StoreError::SerializationError(msg) => write!(f, "alert serialization error: {msg}"),
            StoreError::Transient(msg) => write!(f, "alert store backpressure: {msg}"),
            StoreError::NotFound(msg) => write!(f, "not found in alert store: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("no rows found".to_string()),
            sqlx::Error::PoolTimedOut => StoreError::Transient(err.to_string()),
            other => StoreError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}
