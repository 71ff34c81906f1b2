//! Application state
//!
//! Holds the shared state for the Axum application: the service context, the
//! refresh-cookie settings and the readiness probe.

use std::sync::Arc;

use async_trait::async_trait;
use collab_cache::RedisPool;
use collab_common::CookieConfig;
use collab_db::PgPool;
use collab_service::{ServiceContext, TokenAuthority};

/// Connectivity checks behind `/health/ready`
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn database(&self) -> bool;
    async fn ttl_store(&self) -> bool;
}

/// Probe for the PostgreSQL + Redis deployment
pub struct BackendProbe {
    pub pool: PgPool,
    pub redis: RedisPool,
}

#[async_trait]
impl ReadinessProbe for BackendProbe {
    async fn database(&self) -> bool {
        self.pool.acquire().await.is_ok()
    }

    async fn ttl_store(&self) -> bool {
        self.redis.health_check().await.is_ok()
    }
}

/// Probe for in-process stores, which cannot be unreachable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl ReadinessProbe for AlwaysReady {
    async fn database(&self) -> bool {
        true
    }

    async fn ttl_store(&self) -> bool {
        true
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service_context: Arc<ServiceContext>,
    cookie: Arc<CookieConfig>,
    probe: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Create a new AppState backed by in-process stores
    pub fn new(service_context: ServiceContext, cookie: CookieConfig) -> Self {
        Self {
            service_context: Arc::new(service_context),
            cookie: Arc::new(cookie),
            probe: Arc::new(AlwaysReady),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn token_authority(&self) -> &TokenAuthority {
        self.service_context.token_authority()
    }

    /// Refresh-cookie name and attributes
    pub fn cookie_config(&self) -> &CookieConfig {
        &self.cookie
    }

    pub fn probe(&self) -> &dyn ReadinessProbe {
        self.probe.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}
