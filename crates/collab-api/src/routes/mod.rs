//! Route definitions
//!
//! API routes are mounted under /api/v1, grouped by gatekeeper class.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, health, messages, users};
use crate::middleware::gatekeeper::{refresh_session, require_auth, resolve_identity};
use crate::middleware::RouteClass;
use crate::state::AppState;

/// Create the main API router (health routes are mounted separately)
pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes(state))
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Put `router` behind the gatekeeper for `class`
fn gated(router: Router<AppState>, class: RouteClass, state: &AppState) -> Router<AppState> {
    match class {
        RouteClass::Public => router,
        RouteClass::BestEffort => {
            router.route_layer(from_fn_with_state(state.clone(), resolve_identity))
        }
        RouteClass::Protected => router.route_layer(from_fn_with_state(state.clone(), require_auth)),
        RouteClass::Refresh => {
            router.route_layer(from_fn_with_state(state.clone(), refresh_session))
        }
    }
}

fn api_v1_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(gated(public_auth_routes(), RouteClass::Public, state))
        .merge(gated(
            Router::new().route("/auth/refresh", post(auth::refresh)),
            RouteClass::Refresh,
            state,
        ))
        .merge(gated(
            Router::new().route("/auth/logout", post(auth::logout)),
            RouteClass::BestEffort,
            state,
        ))
        .merge(gated(protected_routes(), RouteClass::Protected, state))
}

/// Login and confirmation-code routes
fn public_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/confirmation-code", post(auth::request_confirmation_code))
        .route(
            "/auth/confirmation-code/verify",
            post(auth::verify_confirmation_code),
        )
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users/@me", get(users::get_current_user))
        .route("/chats/:room_id/messages", get(messages::get_messages))
}
