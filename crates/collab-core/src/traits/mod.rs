//! Ports - the interfaces this core needs from external collaborators

mod events;
mod mailer;
mod repositories;
mod store;

pub use events::RoomEventPublisher;
pub use mailer::Mailer;
pub use repositories::{
    AccountCredentials, AccountRepository, MembershipOracle, MessageQuery, MessageRepository,
    RepoResult,
};
pub use store::TtlStore;
