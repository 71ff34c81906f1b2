//! Repository implementations
//!
//! PostgreSQL implementations of the traits defined in collab-core.

mod account;
mod error;
mod membership;
mod message;

pub use account::PgAccountRepository;
pub use membership::PgMembershipOracle;
pub use message::PgMessageRepository;
