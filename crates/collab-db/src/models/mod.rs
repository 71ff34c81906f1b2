//! Database models (rows as SQLx sees them)

mod account;
mod message;

pub use account::AccountCredentialsModel;
pub use message::MessageModel;
