//! Redis-backed TTL store

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use collab_core::{DomainError, RepoResult, TtlStore};

use crate::pool::{RedisPool, RedisResult};

/// [`TtlStore`] over a shared Redis pool.
///
/// Every command (including pool checkout) is bounded by `timeout`; a timeout
/// or Redis error is reported as [`DomainError::StoreUnavailable`].
#[derive(Debug, Clone)]
pub struct RedisTtlStore {
    pool: RedisPool,
    timeout: Duration,
}

impl RedisTtlStore {
    #[must_use]
    pub fn new(pool: RedisPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Underlying pool, for health checks
    #[must_use]
    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = RedisResult<T>> + Send,
    ) -> RepoResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(op, error = %e, "Redis command failed");
                Err(DomainError::StoreUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Redis command timed out");
                Err(DomainError::StoreUnavailable(format!("{op} timed out")))
            }
        }
    }
}

/// Redis expiries are whole seconds; round up so a key never dies early
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl TtlStore for RedisTtlStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        self.bounded("set", self.pool.set_ex(key, value, ttl_seconds(ttl)))
            .await
    }

    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.bounded("get", self.pool.get_string(key)).await
    }

    async fn exists(&self, key: &str) -> RepoResult<bool> {
        self.bounded("exists", self.pool.exists(key)).await
    }

    async fn delete(&self, key: &str) -> RepoResult<bool> {
        self.bounded("delete", self.pool.delete(key)).await
    }

    async fn increment(&self, key: &str, ttl: Duration) -> RepoResult<i64> {
        self.bounded("increment", self.pool.incr_with_expiry(key, ttl_seconds(ttl)))
            .await
    }
}
