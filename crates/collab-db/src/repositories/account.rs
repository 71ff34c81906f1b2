//! PostgreSQL implementation of AccountRepository

use std::time::Duration;

use async_trait::async_trait;
use collab_core::{AccountCredentials, AccountId, AccountRepository, RepoResult};
use sqlx::PgPool;
use tracing::instrument;

use crate::models::AccountCredentialsModel;

use super::error::bounded;

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    #[instrument(skip(self))]
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<AccountCredentials>> {
        let result = bounded(
            self.timeout,
            sqlx::query_as::<_, AccountCredentialsModel>(
                r#"
                SELECT id, password_hash, email_verified
                FROM accounts
                WHERE LOWER(email) = LOWER($1)
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(result.map(AccountCredentials::from))
    }

    #[instrument(skip(self))]
    async fn mark_email_verified(&self, email: &str) -> RepoResult<Option<AccountId>> {
        let id = bounded(
            self.timeout,
            sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE accounts
                SET email_verified = TRUE
                WHERE LOWER(email) = LOWER($1)
                RETURNING id
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(id.map(AccountId::new))
    }
}
