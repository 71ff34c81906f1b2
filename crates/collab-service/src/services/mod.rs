//! Business logic services
//!
//! Services borrow a [`ServiceContext`] for the duration of one call; the
//! [`TokenAuthority`] is owned by the context and shared by reference.

pub mod auth;
pub mod chat;
pub mod context;
pub mod error;
pub mod mailer;
pub mod token_authority;
pub mod verification;

pub use auth::AuthService;
pub use chat::ChatService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use mailer::LoggingMailer;
pub use token_authority::{TokenAuthority, TokenError, TokenPair};
pub use verification::VerificationService;
