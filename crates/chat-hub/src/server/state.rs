//! Hub server state
//!
//! Shared dependencies for the transport, built once at startup.

use crate::broadcast::{Hub, HubConfig};
use crate::handlers::{ChatHandler, HubHandler};
use chat_common::AppConfig;
use std::sync::Arc;

/// Hub server application state
#[derive(Clone)]
pub struct HubState {
    /// The broadcast hub
    hub: Arc<Hub>,
    /// Lifecycle callbacks invoked by the transport
    handler: Arc<dyn HubHandler>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl HubState {
    /// Create state with the chat handler
    pub fn new(config: AppConfig) -> Self {
        let handler = Arc::new(ChatHandler::from(&config.limits));
        Self::with_handler(config, handler)
    }

    /// Create state with a custom handler
    pub fn with_handler(config: AppConfig, handler: Arc<dyn HubHandler>) -> Self {
        let hub = Hub::new_shared(HubConfig::from(&config.limits));
        Self {
            hub,
            handler,
            config: Arc::new(config),
        }
    }

    /// Get the hub
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Get a shared handle to the hub
    pub fn hub_handle(&self) -> Arc<Hub> {
        Arc::clone(&self.hub)
    }

    /// Get the lifecycle handler
    pub fn handler(&self) -> &dyn HubHandler {
        self.handler.as_ref()
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for HubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubState")
            .field("hub", &self.hub)
            .field("config", &"AppConfig")
            .finish_non_exhaustive()
    }
}
