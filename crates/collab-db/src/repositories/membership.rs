//! PostgreSQL implementation of MembershipOracle

use std::time::Duration;

use async_trait::async_trait;
use collab_core::{AccountId, MembershipOracle, RepoResult, RoomId};
use sqlx::PgPool;
use tracing::instrument;

use super::error::bounded;

/// Answers room-membership queries from `chat_room_members`
#[derive(Clone)]
pub struct PgMembershipOracle {
    pool: PgPool,
    timeout: Duration,
}

impl PgMembershipOracle {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl MembershipOracle for PgMembershipOracle {
    #[instrument(skip(self))]
    async fn is_member(&self, account_id: AccountId, room_id: RoomId) -> RepoResult<bool> {
        bounded(
            self.timeout,
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM chat_room_members WHERE room_id = $1 AND account_id = $2
                )
                "#,
            )
            .bind(room_id.into_inner())
            .bind(account_id.into_inner())
            .fetch_one(&self.pool),
        )
        .await
    }
}
