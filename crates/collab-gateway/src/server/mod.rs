//! Gateway server setup
//!
//! Provides the WebSocket routes, the production wiring, and the runner.
//! The runner also starts the room event subscriber that feeds the hub.

mod handler;
mod state;

pub use handler::{gateway_handler, HandshakeParams};
pub use state::GatewayState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use collab_cache::{RedisPool, RedisTtlStore, RoomEventSubscriber, SubscriberConfig};
use collab_common::{AppConfig, AppError, TokenSigner};
use collab_db::{create_pool, PgAccountRepository, PgMembershipOracle, PgMessageRepository};
use collab_service::{LoggingMailer, ServiceContext};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::hub::forward_room_events;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect the stores and create `GatewayState`
pub async fn create_gateway_state(config: &AppConfig) -> Result<GatewayState, AppError> {
    let timeout = config.store.timeout();

    tracing::info!("Connecting to PostgreSQL...");
    let db_config = collab_db::DatabaseConfig::from(&config.database).with_acquire_timeout(timeout);
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Config(format!("Database connection failed: {e}")))?;
    tracing::info!("PostgreSQL connection established");

    tracing::info!("Creating Redis pool...");
    let redis = RedisPool::from_config(&config.redis).map_err(|e| AppError::Config(e.to_string()))?;

    let service_context = ServiceContext::builder()
        .ttl_store(Arc::new(RedisTtlStore::new(redis, timeout)))
        .membership(Arc::new(PgMembershipOracle::new(pool.clone(), timeout)))
        .message_repo(Arc::new(PgMessageRepository::new(pool.clone(), timeout)))
        .account_repo(Arc::new(PgAccountRepository::new(pool, timeout)))
        .mailer(Arc::new(LoggingMailer))
        .signer(Arc::new(TokenSigner::from_config(&config.jwt)))
        .verification(config.verification.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(GatewayState::from_service_context(service_context))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/ws", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(&config).await?;

    let (_subscriber, events) = RoomEventSubscriber::spawn(SubscriberConfig::from(&config.redis));
    tokio::spawn(forward_room_events(state.shared_hub(), events));

    let app = create_app(state);

    run_server(app, addr).await
}
