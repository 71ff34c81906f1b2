//! Error handling utilities for repositories

use std::future::Future;
use std::time::Duration;

use collab_core::{DomainError, RepoResult};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
///
/// Pool exhaustion and lost connections are transient and reported as
/// `StoreUnavailable`; everything else is a database error.
pub fn map_db_error(e: SqlxError) -> DomainError {
    match e {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
            DomainError::StoreUnavailable(e.to_string())
        }
        other => DomainError::DatabaseError(other.to_string()),
    }
}

/// Run a query under `timeout`; elapsing is `StoreUnavailable`
pub async fn bounded<T>(
    timeout: Duration,
    query: impl Future<Output = Result<T, SqlxError>> + Send,
) -> RepoResult<T> {
    match tokio::time::timeout(timeout, query).await {
        Ok(result) => result.map_err(map_db_error),
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Database query timed out");
            Err(DomainError::StoreUnavailable("database query timed out".to_string()))
        }
    }
}
