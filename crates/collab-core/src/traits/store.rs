//! Key-value store with per-key expiry

use std::time::Duration;

use async_trait::async_trait;

use super::repositories::RepoResult;

/// Shared key-value store with per-key TTL.
///
/// Every operation is atomic at the single-key level; nothing here offers
/// cross-key atomicity. Implementations bound every call with a timeout and
/// report a timeout or connection failure as
/// [`DomainError::StoreUnavailable`](crate::DomainError::StoreUnavailable),
/// never as a missing key.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value and expiry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()>;

    /// Read the value under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Check whether `key` is present
    async fn exists(&self, key: &str) -> RepoResult<bool>;

    /// Remove `key`, returning whether something was deleted
    async fn delete(&self, key: &str) -> RepoResult<bool>;

    /// Atomically increment the counter under `key` and return the new value.
    ///
    /// `ttl` is applied when the increment creates the key; later increments
    /// do not extend the window.
    async fn increment(&self, key: &str, ttl: Duration) -> RepoResult<i64>;
}
