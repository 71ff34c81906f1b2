//! In-memory implementations of the relational-store traits
//!
//! Used by the test suites and for running the servers without PostgreSQL.
//! Each type can be told to fail, so callers can exercise their
//! `StoreUnavailable` paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use collab_core::{
    AccountCredentials, AccountId, AccountRepository, ChatMessage, DomainError, MembershipOracle,
    MessageId, MessageQuery, MessageRepository, NewMessage, RepoResult, RoomId,
};
use parking_lot::RwLock;

fn unavailable() -> DomainError {
    DomainError::StoreUnavailable("in-memory store marked unavailable".to_string())
}

// ============================================================================
// Membership
// ============================================================================

/// Membership pairs held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembership {
    pairs: Arc<RwLock<HashSet<(AccountId, RoomId)>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryMembership {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, account_id: AccountId, room_id: RoomId) {
        self.pairs.write().insert((account_id, room_id));
    }

    pub fn remove(&self, account_id: AccountId, room_id: RoomId) {
        self.pairs.write().remove(&(account_id, room_id));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MembershipOracle for InMemoryMembership {
    async fn is_member(&self, account_id: AccountId, room_id: RoomId) -> RepoResult<bool> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.pairs.read().contains(&(account_id, room_id)))
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Append-only message log with sequential ids
#[derive(Debug, Clone)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    next_id: Arc<AtomicI64>,
    failing: Arc<AtomicBool>,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self {
            messages: Arc::default(),
            next_id: Arc::new(AtomicI64::new(1)),
            failing: Arc::default(),
        }
    }
}

impl InMemoryMessageRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything persisted so far, in persistence order
    #[must_use]
    pub fn all(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: NewMessage) -> RepoResult<ChatMessage> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut messages = self.messages.write();
        let id = MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let stored = message.into_message(id, Utc::now());
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_room(
        &self,
        room_id: RoomId,
        query: MessageQuery,
    ) -> RepoResult<Vec<ChatMessage>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let limit = usize::try_from(query.limit.clamp(1, 100)).unwrap_or(100);

        Ok(self
            .messages
            .read()
            .iter()
            .rev()
            .filter(|m| m.room_id == room_id)
            .filter(|m| query.before.map_or(true, |before| m.id < before))
            .take(limit)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Accounts keyed by lowercase email
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<String, AccountCredentials>>>,
}

impl InMemoryAccountRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with an already hashed password
    pub fn insert(&self, email: &str, credentials: AccountCredentials) {
        self.accounts
            .write()
            .insert(email.to_lowercase(), credentials);
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<AccountCredentials>> {
        Ok(self.accounts.read().get(&email.to_lowercase()).cloned())
    }

    async fn mark_email_verified(&self, email: &str) -> RepoResult<Option<AccountId>> {
        Ok(self
            .accounts
            .write()
            .get_mut(&email.to_lowercase())
            .map(|account| {
                account.email_verified = true;
                account.id
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(room: i64, content: &str) -> NewMessage {
        NewMessage::new(
            RoomId::new(room),
            AccountId::new(1),
            content.to_string(),
            vec![],
        )
    }

    #[tokio::test]
    async fn test_membership() {
        let oracle = InMemoryMembership::new();
        oracle.add(AccountId::new(1), RoomId::new(10));

        assert!(oracle.is_member(AccountId::new(1), RoomId::new(10)).await.unwrap());
        assert!(!oracle.is_member(AccountId::new(2), RoomId::new(10)).await.unwrap());

        oracle.remove(AccountId::new(1), RoomId::new(10));
        assert!(!oracle.is_member(AccountId::new(1), RoomId::new(10)).await.unwrap());

        oracle.set_failing(true);
        assert!(matches!(
            oracle.is_member(AccountId::new(1), RoomId::new(10)).await,
            Err(DomainError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_messages_paged_newest_first() {
        let repo = InMemoryMessageRepository::new();
        for i in 0..5 {
            repo.create(new_message(1, &format!("m{i}"))).await.unwrap();
        }
        repo.create(new_message(2, "other room")).await.unwrap();

        let page = repo
            .find_by_room(RoomId::new(1), MessageQuery { before: None, limit: 2 })
            .await
            .unwrap();
        assert_eq!(
            page.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["m4", "m3"]
        );

        let next = repo
            .find_by_room(
                RoomId::new(1),
                MessageQuery {
                    before: Some(page[1].id),
                    limit: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(next.len(), 3);
        assert_eq!(next[0].content, "m2");
    }

    #[tokio::test]
    async fn test_failing_message_store() {
        let repo = InMemoryMessageRepository::new();
        repo.set_failing(true);

        assert!(repo.create(new_message(1, "x")).await.is_err());
        assert!(repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_accounts() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(
            "Ada@Example.com",
            AccountCredentials {
                id: AccountId::new(7),
                password_hash: "hash".to_string(),
                email_verified: false,
            },
        );

        let found = repo
            .find_credentials_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(!found.email_verified);

        assert_eq!(
            repo.mark_email_verified("ADA@example.com").await.unwrap(),
            Some(AccountId::new(7))
        );
        assert!(repo
            .find_credentials_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap()
            .email_verified);
        assert_eq!(repo.mark_email_verified("nobody@example.com").await.unwrap(), None);
    }
}
