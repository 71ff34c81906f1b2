//! Gateway state
//!
//! Application state for the gateway server.

use std::sync::Arc;

use collab_service::ServiceContext;

use crate::hub::Hub;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    hub: Arc<Hub>,
}

impl GatewayState {
    pub fn new(hub: Hub) -> Self {
        Self { hub: Arc::new(hub) }
    }

    /// Build a hub over `service_context`
    pub fn from_service_context(service_context: ServiceContext) -> Self {
        Self::new(Hub::new(Arc::new(service_context)))
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Owned handle for background tasks
    pub fn shared_hub(&self) -> Arc<Hub> {
        Arc::clone(&self.hub)
    }

    pub fn service_context(&self) -> &ServiceContext {
        self.hub.service_context()
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hub", &self.hub)
            .finish()
    }
}
