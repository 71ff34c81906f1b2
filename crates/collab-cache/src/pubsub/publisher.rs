//! Redis Pub/Sub publisher

use std::time::Duration;

use async_trait::async_trait;
use collab_core::{DomainError, RepoResult, RoomEvent, RoomEventPublisher};

use super::ROOM_EVENTS_CHANNEL;
use crate::pool::RedisPool;

/// Publishes room events on [`ROOM_EVENTS_CHANNEL`]
#[derive(Debug, Clone)]
pub struct RedisRoomEventPublisher {
    pool: RedisPool,
    timeout: Duration,
}

impl RedisRoomEventPublisher {
    #[must_use]
    pub fn new(pool: RedisPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl RoomEventPublisher for RedisRoomEventPublisher {
    async fn publish(&self, event: &RoomEvent) -> RepoResult<()> {
        let payload = event
            .to_json()
            .map_err(|e| DomainError::InternalError(e.to_string()))?;

        match tokio::time::timeout(self.timeout, self.pool.publish(ROOM_EVENTS_CHANNEL, &payload)).await {
            Ok(Ok(receivers)) => {
                tracing::debug!(
                    channel = ROOM_EVENTS_CHANNEL,
                    room_id = %event.room_id(),
                    receivers,
                    "Published room event"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Room event publish failed");
                Err(DomainError::StoreUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Room event publish timed out");
                Err(DomainError::StoreUnavailable("publish timed out".to_string()))
            }
        }
    }
}
