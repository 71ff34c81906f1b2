//! [`TtlStore`](collab_core::TtlStore) implementations

mod memory_store;
mod redis_store;

pub use memory_store::MemoryTtlStore;
pub use redis_store::RedisTtlStore;
