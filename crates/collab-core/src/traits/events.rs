use async_trait::async_trait;

use super::repositories::RepoResult;
use crate::entities::RoomEvent;

/// Outbound channel from the CRUD layer to the realtime gateway
#[async_trait]
pub trait RoomEventPublisher: Send + Sync {
    /// Announce `event` to every gateway instance
    async fn publish(&self, event: &RoomEvent) -> RepoResult<()>;
}
