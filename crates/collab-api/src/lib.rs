//! # collab-api
//!
//! REST API server built with Axum. Every route passes through the request
//! gatekeeper, which authenticates, silently renews or rejects.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, run_server};
pub use state::{AlwaysReady, AppState, BackendProbe, ReadinessProbe};
