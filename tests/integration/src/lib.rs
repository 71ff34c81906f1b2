//! Integration test utilities for the collab backend
//!
//! Runs the REST API and the WebSocket gateway on ephemeral ports over
//! in-memory stores, and provides clients for both.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
