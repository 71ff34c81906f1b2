//! Axum extractors for request handling
//!
//! Custom extractors for the gatekeeper's identity, path ids, and validated
//! bodies and query strings.

mod auth;
mod path;
mod validated;

pub use auth::{AuthAccount, OptionalAuthAccount};
pub use path::RoomIdPath;
pub use validated::{ValidatedJson, ValidatedQuery};
