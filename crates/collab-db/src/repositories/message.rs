//! PostgreSQL implementation of MessageRepository

use std::time::Duration;

use async_trait::async_trait;
use collab_core::{ChatMessage, MessageQuery, MessageRepository, NewMessage, RepoResult, RoomId};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;

use crate::models::MessageModel;

use super::error::bounded;

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message), fields(room_id = %message.room_id, author_id = %message.author_id))]
    async fn create(&self, message: NewMessage) -> RepoResult<ChatMessage> {
        let model = bounded(
            self.timeout,
            sqlx::query_as::<_, MessageModel>(
                r#"
                INSERT INTO chat_messages (room_id, author_id, content, attachments)
                VALUES ($1, $2, $3, $4)
                RETURNING id, room_id, author_id, content, attachments, created_at
                "#,
            )
            .bind(message.room_id.into_inner())
            .bind(message.author_id.into_inner())
            .bind(&message.content)
            .bind(Json(&message.attachments))
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(ChatMessage::from(model))
    }

    #[instrument(skip(self))]
    async fn find_by_room(
        &self,
        room_id: RoomId,
        query: MessageQuery,
    ) -> RepoResult<Vec<ChatMessage>> {
        let limit = query.limit.clamp(1, 100);

        let results = match query.before {
            Some(before) => {
                // Fetch messages before cursor (scrolling up)
                bounded(
                    self.timeout,
                    sqlx::query_as::<_, MessageModel>(
                        r#"
                        SELECT id, room_id, author_id, content, attachments, created_at
                        FROM chat_messages
                        WHERE room_id = $1 AND id < $2
                        ORDER BY id DESC
                        LIMIT $3
                        "#,
                    )
                    .bind(room_id.into_inner())
                    .bind(before.into_inner())
                    .bind(limit)
                    .fetch_all(&self.pool),
                )
                .await?
            }
            None => {
                bounded(
                    self.timeout,
                    sqlx::query_as::<_, MessageModel>(
                        r#"
                        SELECT id, room_id, author_id, content, attachments, created_at
                        FROM chat_messages
                        WHERE room_id = $1
                        ORDER BY id DESC
                        LIMIT $2
                        "#,
                    )
                    .bind(room_id.into_inner())
                    .bind(limit)
                    .fetch_all(&self.pool),
                )
                .await?
            }
        };

        Ok(results.into_iter().map(ChatMessage::from).collect())
    }
}
