//! # collab-core
//!
//! Domain layer containing identifiers, chat entities, and the traits through
//! which the session and chat core reach external storage.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Attachment, ChatMessage, NewMessage, RoomEvent, MAX_CONTENT_LENGTH};
pub use error::DomainError;
pub use traits::{
    AccountCredentials, AccountRepository, Mailer, MembershipOracle, MessageQuery,
    MessageRepository, RepoResult, RoomEventPublisher, TtlStore,
};
pub use value_objects::{AccountId, IdParseError, MessageId, RoomId};
