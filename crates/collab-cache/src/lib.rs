//! # collab-cache
//!
//! Key-value TTL store used for refresh-token records, the access-token
//! revocation list and confirmation-code counters, plus the Redis Pub/Sub
//! bridge that carries room events to the gateway.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Redis store**: [`RedisTtlStore`], the production [`TtlStore`](collab_core::TtlStore)
//! - **Memory store**: [`MemoryTtlStore`], for tests and single-process development
//! - **Pub/Sub**: room events from the API to every gateway instance
//!
//! ## Example
//!
//! ```ignore
//! use collab_cache::{RedisPool, RedisPoolConfig, RedisTtlStore};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisTtlStore::new(pool, Duration::from_secs(2));
//! store.set("refresh:42", &token, Duration::from_secs(604_800)).await?;
//! ```

pub mod pool;
pub mod pubsub;
pub mod store;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{RedisRoomEventPublisher, RoomEventSubscriber, SubscriberConfig, ROOM_EVENTS_CHANNEL};

// Re-export store types
pub use store::{MemoryTtlStore, RedisTtlStore};
