//! In-memory TTL store
//!
//! Suitable for tests and single-process development. Expiry is checked on
//! access against [`tokio::time::Instant`], so tests can drive it with a
//! paused clock. Keys that are never read again (most `revoked:` entries)
//! are dropped by a sweep every [`SWEEP_INTERVAL`] writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use collab_core::{DomainError, RepoResult, TtlStore};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Writes between two sweeps of expired entries
pub const SWEEP_INTERVAL: usize = 64;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory [`TtlStore`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryTtlStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryTtlStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable` (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remaining lifetime of `key`, `None` when absent or expired
    #[must_use]
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now)
    }

    /// Number of live keys
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held, expired ones included
    #[cfg(test)]
    fn stored(&self) -> usize {
        self.entries.lock().len()
    }

    fn insert(&self, entries: &mut HashMap<String, Entry>, key: &str, entry: Entry, now: Instant) {
        entries.insert(key.to_string(), entry);
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            entries.retain(|_, e| e.is_live(now));
        }
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DomainError::StoreUnavailable(
                "memory store marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.insert(
            &mut entries,
            key,
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
            now,
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> RepoResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> RepoResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .remove(key)
            .is_some_and(|e| e.is_live(now)))
    }

    async fn increment(&self, key: &str, ttl: Duration) -> RepoResult<i64> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let current = match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry),
            _ => None,
        };

        let (count, expires_at) = match current {
            Some(entry) => {
                let count = entry.value.parse::<i64>().map_err(|_| {
                    DomainError::CacheError(format!("value at {key} is not an integer"))
                })?;
                (count + 1, entry.expires_at)
            }
            None => (1, now + ttl),
        };

        self.insert(
            &mut entries,
            key,
            Entry {
                value: count.to_string(),
                expires_at,
            },
            now,
        );
        Ok(count)
    }
}
