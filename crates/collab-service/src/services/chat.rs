//! Chat service
//!
//! Membership-gated message persistence and history reads. Membership is asked
//! of the oracle on every call, never cached.

use collab_core::{AccountId, ChatMessage, DomainError, MessageQuery, NewMessage, RoomEvent, RoomId};
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Chat service
pub struct ChatService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChatService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fail with `NotAMember` unless `account_id` belongs to `room_id`
    ///
    /// # Errors
    /// `NotAMember`, or `StoreUnavailable` when the oracle cannot answer
    pub async fn require_member(&self, account_id: AccountId, room_id: RoomId) -> ServiceResult<()> {
        if self.ctx.membership().is_member(account_id, room_id).await? {
            Ok(())
        } else {
            debug!(account_id = %account_id, room_id = %room_id, "Membership check failed");
            Err(DomainError::NotAMember {
                account: account_id,
                room: room_id,
            }
            .into())
        }
    }

    /// Validate, check membership, and persist a message
    #[instrument(skip(self, message), fields(room_id = %message.room_id, author_id = %message.author_id))]
    pub async fn post_message(&self, message: NewMessage) -> ServiceResult<ChatMessage> {
        message.validate()?;
        self.require_member(message.author_id, message.room_id).await?;

        let stored = self.ctx.message_repo().create(message).await.map_err(|e| {
            warn!(error = %e, "Message persistence failed");
            e
        })?;
        debug!(message_id = %stored.id, "Message persisted");

        Ok(stored)
    }

    /// Page of a room's history, newest first
    #[instrument(skip(self, query), fields(account_id = %account_id, room_id = %room_id))]
    pub async fn history(
        &self,
        account_id: AccountId,
        room_id: RoomId,
        query: MessageQuery,
    ) -> ServiceResult<Vec<ChatMessage>> {
        self.require_member(account_id, room_id).await?;
        Ok(self.ctx.message_repo().find_by_room(room_id, query).await?)
    }

    /// Tell every gateway about a membership row or room the CRUD layer has
    /// already deleted. Call after the change is committed.
    ///
    /// # Errors
    /// `StoreUnavailable` when the event could not be published
    #[instrument(skip(self), fields(room_id = %event.room_id()))]
    pub async fn announce(&self, event: RoomEvent) -> ServiceResult<()> {
        let Some(publisher) = self.ctx.room_events() else {
            warn!("No room event publisher configured, event dropped");
            return Ok(());
        };
        publisher.publish(&event).await?;
        info!(?event, "Room event announced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::context::tests::{context_with_store, test_context};
    use crate::services::ServiceError;

    fn message(author: i64, content: &str) -> NewMessage {
        NewMessage::new(
            RoomId::new(10),
            AccountId::new(author),
            content.to_string(),
            vec![],
        )
    }

    #[tokio::test]
    async fn test_member_can_post_and_read() {
        let stores = test_context();
        stores.membership.add(AccountId::new(1), RoomId::new(10));
        let service = ChatService::new(&stores.ctx);

        let stored = service.post_message(message(1, "hello")).await.unwrap();
        assert_eq!(stored.content, "hello");

        let page = service
            .history(
                AccountId::new(1),
                RoomId::new(10),
                MessageQuery {
                    before: None,
                    limit: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_non_member_post_is_not_persisted() {
        let stores = test_context();
        let service = ChatService::new(&stores.ctx);

        let err = service.post_message(message(2, "intruder")).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(stores.messages.all().is_empty());
    }

    #[tokio::test]
    async fn test_membership_is_rechecked() {
        let stores = test_context();
        stores.membership.add(AccountId::new(1), RoomId::new(10));
        let service = ChatService::new(&stores.ctx);

        service.post_message(message(1, "first")).await.unwrap();
        stores.membership.remove(AccountId::new(1), RoomId::new(10));
        assert!(service.post_message(message(1, "second")).await.is_err());
        assert_eq!(stores.messages.all().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let stores = test_context();
        stores.membership.add(AccountId::new(1), RoomId::new(10));

        let err = ChatService::new(&stores.ctx)
            .post_message(message(1, "   "))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_oracle_outage_is_unavailable() {
        let stores = test_context();
        stores.membership.set_failing(true);

        let err = ChatService::new(&stores.ctx)
            .require_member(AccountId::new(1), RoomId::new(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::StoreUnavailable(_))));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_announce_publishes_event() {
        let stores = test_context();
        let event = RoomEvent::MemberRemoved {
            room_id: RoomId::new(10),
            account_id: AccountId::new(2),
        };

        ChatService::new(&stores.ctx).announce(event).await.unwrap();
        assert_eq!(stores.room_events.published(), vec![event]);
    }

    #[tokio::test]
    async fn test_announce_without_publisher_is_dropped() {
        let ctx = context_with_store(std::sync::Arc::new(collab_cache::MemoryTtlStore::new()));
        ChatService::new(&ctx)
            .announce(RoomEvent::RoomDeleted { room_id: RoomId::new(10) })
            .await
            .unwrap();
    }
}
