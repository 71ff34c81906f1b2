//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::{ChatMessage, NewMessage};
use crate::error::DomainError;
use crate::value_objects::{AccountId, MessageId, RoomId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Membership Oracle
// ============================================================================

/// Read path answering room-membership queries.
///
/// Callers ask on every join and every send; answers are never cached.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Check if `account_id` is a member of `room_id`
    async fn is_member(&self, account_id: AccountId, room_id: RoomId) -> RepoResult<bool>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Pagination options for message history
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    /// Only messages with an id lower than this
    pub before: Option<MessageId>,
    pub limit: i64,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a message, assigning its id and timestamp
    async fn create(&self, message: NewMessage) -> RepoResult<ChatMessage>;

    /// List messages in a room, newest first
    async fn find_by_room(&self, room_id: RoomId, query: MessageQuery)
        -> RepoResult<Vec<ChatMessage>>;
}

// ============================================================================
// Account Repository
// ============================================================================

/// What login needs to know about an account
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub id: AccountId,
    pub password_hash: String,
    pub email_verified: bool,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find credentials by email
    async fn find_credentials_by_email(&self, email: &str)
        -> RepoResult<Option<AccountCredentials>>;

    /// Mark the account owning `email` as verified, returning its id
    async fn mark_email_verified(&self, email: &str) -> RepoResult<Option<AccountId>>;
}
