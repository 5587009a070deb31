//! One configured gateway connection and everything it owns.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::coordinator::{Coordinator, SetupError, Snapshot};
use crate::gateway::{GatewayClient, Timeouts, Transport};
use crate::sensor::{self, SensorState};
use crate::services::{ServiceRegistry, ServiceResult};

pub const DOMAIN: &str = "openclaw";

/// A set-up integration instance.
///
/// Owns the client, the coordinator with its poll task, and the command
/// table. Nothing is shared between instances.
pub struct Integration {
    entry_id: String,
    config: Config,
    coordinator: Arc<Coordinator>,
    services: ServiceRegistry,
}

impl Integration {
    pub async fn setup(config: Config) -> Result<Self, SetupError> {
        Self::setup_with(config, Timeouts::default()).await
    }

    /// Validate the entry, run the first refresh, then start polling.
    pub async fn setup_with(config: Config, timeouts: Timeouts) -> Result<Self, SetupError> {
        config
            .validate()
            .map_err(|e| SetupError::InvalidConfig(e.to_string()))?;

        let entry_id = uuid::Uuid::new_v4().to_string();
        let connection = config.connection();
        tracing::info!(
            entry_id = %entry_id,
            "Setting up {} integration for {} (agent {})",
            DOMAIN,
            connection.base_url,
            connection.agent_id
        );

        let client = GatewayClient::new(&connection, Transport::new()).with_timeouts(timeouts);
        let coordinator = Arc::new(Coordinator::new(DOMAIN, client, config.scan_interval()));

        coordinator.first_refresh().await?;
        coordinator.start();

        let services = ServiceRegistry::for_coordinator(coordinator.clone());
        tracing::debug!(entry_id = %entry_id, services = ?services.names(), "Registered commands");

        Ok(Self {
            entry_id,
            config,
            coordinator,
            services,
        })
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn snapshot(&self) -> Snapshot {
        self.coordinator.snapshot()
    }

    pub fn sensors(&self) -> Vec<SensorState> {
        sensor::render_all(&self.coordinator.snapshot())
    }

    pub async fn call(&self, service: &str, data: Value) -> ServiceResult {
        self.services.call(service, data).await
    }

    /// Stop polling, close the transport and drop the command table.
    pub fn unload(self) {
        drop(self);
    }

    /// Rebuild with new configuration. The old instance is released first.
    pub async fn reload(self, config: Config) -> Result<Self, SetupError> {
        let timeouts = *self.coordinator.client().timeouts();
        drop(self);
        Self::setup_with(config, timeouts).await
    }
}

/// Stops polling and closes the transport, whether or not `unload` was called.
impl Drop for Integration {
    fn drop(&mut self) {
        self.coordinator.shutdown();
        tracing::info!(entry_id = %self.entry_id, "Unloaded {} integration", DOMAIN);
    }
}
