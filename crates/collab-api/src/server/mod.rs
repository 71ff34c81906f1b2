//! Server setup and initialization
//!
//! Provides the application builder, the production wiring, and the runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use collab_cache::{RedisPool, RedisRoomEventPublisher, RedisTtlStore};
use collab_common::{AppConfig, AppError, TokenSigner};
use collab_db::{create_pool, PgAccountRepository, PgMembershipOracle, PgMessageRepository};
use collab_service::{LoggingMailer, ServiceContext};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes};
use crate::state::{AppState, BackendProbe};

/// Build the application with the base middleware stack (no rate limiting)
pub fn create_app(state: AppState) -> Router {
    let router = create_router(&state).merge(health_routes());
    apply_middleware(router, &collab_common::CorsConfig::default(), false).with_state(state)
}

/// Build the production application: rate limiting on the API, not on health
fn create_app_with_config(state: AppState, config: &AppConfig) -> Router {
    let is_production = config.app.env.is_production();
    let api = apply_middleware_with_config(
        create_router(&state),
        &config.rate_limit,
        &config.cors,
        is_production,
    );
    let health = apply_middleware(health_routes(), &config.cors, is_production);

    api.merge(health).with_state(state)
}

/// Connect the stores and build AppState
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, AppError> {
    let timeout = config.store.timeout();

    info!("Connecting to PostgreSQL...");
    let db_config = collab_db::DatabaseConfig::from(&config.database).with_acquire_timeout(timeout);
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Config(format!("Database connection failed: {e}")))?;
    info!("PostgreSQL connection established");

    info!("Creating Redis pool...");
    let redis = RedisPool::from_config(&config.redis)
        .map_err(|e| AppError::Config(e.to_string()))?;

    let service_context = ServiceContext::builder()
        .ttl_store(Arc::new(RedisTtlStore::new(redis.clone(), timeout)))
        .membership(Arc::new(PgMembershipOracle::new(pool.clone(), timeout)))
        .message_repo(Arc::new(PgMessageRepository::new(pool.clone(), timeout)))
        .account_repo(Arc::new(PgAccountRepository::new(pool.clone(), timeout)))
        .mailer(Arc::new(LoggingMailer))
        .room_events(Arc::new(RedisRoomEventPublisher::new(redis.clone(), timeout)))
        .signer(Arc::new(TokenSigner::from_config(&config.jwt)))
        .verification(config.verification.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config.cookie.clone())
        .with_probe(Arc::new(BackendProbe { pool, redis })))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let state = create_app_state(&config).await?;
    let app = create_app_with_config(state, &config);

    run_server(app, addr).await
}
