//! Huginn error types

use std::time::Duration;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Storage outcomes
    /// No entry exists for the requested key. Expected on every cold key.
    #[error("cache entry not found")]
    NotFound,

    /// The storage backend is not ready (e.g. no database connection yet).
    /// Callers treat this as "no usable cache", not as a failure.
    #[error("storage subsystem is unavailable")]
    StorageUnavailable,

    #[error("storage error: {0}")]
    Storage(String),

    /// The backend found state that must never exist, such as two rows
    /// for one key.
    #[error("storage invariant violated: {0}")]
    InvariantViolation(String),

    // Upstream outcomes
    #[error("endpoint API is unavailable")]
    UpstreamUnavailable,

    #[error("no response within the SLA of {sla:?}")]
    DeadlineExceeded { sla: Duration },

    #[error("cannot transform upstream payload: {0}")]
    InvalidPayload(String),

    // Transport errors outside the request race (admin client, etc.)
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HuginnError {
    /// Whether this error only means "the cache had nothing usable".
    ///
    /// The coordinator falls through to upstream on these; they never reach
    /// the client.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::NotFound | Self::StorageUnavailable)
    }

    /// HTTP status a frontend should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::StorageUnavailable => 503,
            Self::DeadlineExceeded { .. } => 504,
            Self::InvalidPayload(_) => 502,
            Self::Api { status, .. } => *status,
            _ => 500,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for HuginnError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            HuginnError::StorageUnavailable
        } else {
            HuginnError::Storage(err.to_string())
        }
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for HuginnError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::debug!(error = %err, "failed to check out a database connection");
        HuginnError::StorageUnavailable
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
