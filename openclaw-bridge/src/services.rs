//! Command dispatch table.
//!
//! Each integration instance owns a [`ServiceRegistry`] mapping command names
//! to typed handlers. Commands are one-shot user requests, so gateway
//! failures are returned to the caller as-is.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use openclaw_common::GatewayResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::coordinator::{Coordinator, UpdateFailure};
use crate::error::Error;

pub const SERVICE_SEND_MESSAGE: &str = "send_message";
pub const SERVICE_RUN_TASK: &str = "run_task";
pub const SERVICE_REFRESH_STATUS: &str = "refresh_status";
pub const SERVICE_HEALTH_CHECK: &str = "health_check";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Invalid service data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Gateway(#[from] Error),

    #[error("Refresh failed: {0}")]
    UpdateFailed(#[from] UpdateFailure),
}

pub type ServiceResult = std::result::Result<Option<GatewayResponse>, ServiceError>;

/// A command the integration exposes to the host.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, data: Value) -> ServiceResult;
}

/// Commands registered by one integration instance.
pub struct ServiceRegistry {
    services: HashMap<&'static str, Arc<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// The four gateway commands, bound to one coordinator.
    pub fn for_coordinator(coordinator: Arc<Coordinator>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SendMessage(coordinator.clone())));
        registry.register(Arc::new(RunTask(coordinator.clone())));
        registry.register(Arc::new(RefreshStatus(coordinator.clone())));
        registry.register(Arc::new(HealthCheck(coordinator)));
        registry
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        tracing::debug!(service = service.name(), "Registering service");
        self.services.insert(service.name(), service);
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.services.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn call(&self, name: &str, data: Value) -> ServiceResult {
        let service = self
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(name.to_string()))?;

        tracing::debug!(service = name, "Calling service");
        service.call(data).await
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct MessageData {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TaskData {
    task: String,
}

/// Deserialize service data; `null` counts as an empty object.
fn parse_data<T: DeserializeOwned>(data: Value) -> Result<T, ServiceError> {
    let data = match data {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => data,
        other => {
            return Err(ServiceError::InvalidData(format!(
                "expected an object, got {}",
                other
            )))
        }
    };
    serde_json::from_value(data).map_err(|e| ServiceError::InvalidData(e.to_string()))
}

fn require_text(field: &str, value: String) -> Result<String, ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidData(format!("{} must not be empty", field)));
    }
    Ok(value)
}

struct SendMessage(Arc<Coordinator>);

#[async_trait]
impl Service for SendMessage {
    fn name(&self) -> &'static str {
        SERVICE_SEND_MESSAGE
    }

    async fn call(&self, data: Value) -> ServiceResult {
        let MessageData { message } = parse_data(data)?;
        let message = require_text("message", message)?;
        let response = self.0.client().send_message(&message).await?;
        Ok(Some(response))
    }
}

struct RunTask(Arc<Coordinator>);

#[async_trait]
impl Service for RunTask {
    fn name(&self) -> &'static str {
        SERVICE_RUN_TASK
    }

    async fn call(&self, data: Value) -> ServiceResult {
        let TaskData { task } = parse_data(data)?;
        let task = require_text("task", task)?;
        let response = self.0.client().run_task(&task).await?;
        Ok(Some(response))
    }
}

struct RefreshStatus(Arc<Coordinator>);

#[async_trait]
impl Service for RefreshStatus {
    fn name(&self) -> &'static str {
        SERVICE_REFRESH_STATUS
    }

    async fn call(&self, _data: Value) -> ServiceResult {
        self.0.refresh().await?;
        Ok(None)
    }
}

struct HealthCheck(Arc<Coordinator>);

#[async_trait]
impl Service for HealthCheck {
    fn name(&self) -> &'static str {
        SERVICE_HEALTH_CHECK
    }

    async fn call(&self, _data: Value) -> ServiceResult {
        let response = self.0.client().health().await?;
        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gateway::{GatewayClient, Transport};
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> ServiceRegistry {
        let config = GatewayConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: "abc".to_string(),
            agent_id: "main".to_string(),
        };
        let client = GatewayClient::new(&config, Transport::new());
        let coordinator = Arc::new(Coordinator::new("openclaw", client, Duration::from_secs(30)));
        ServiceRegistry::for_coordinator(coordinator)
    }

    #[test]
    fn test_registers_all_commands() {
        let registry = registry();
        assert_eq!(
            registry.names(),
            vec![
                SERVICE_HEALTH_CHECK,
                SERVICE_REFRESH_STATUS,
                SERVICE_RUN_TASK,
                SERVICE_SEND_MESSAGE
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let err = registry().call("reboot", Value::Null).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(name) if name == "reboot"));
    }

    #[tokio::test]
    async fn test_send_message_requires_message() {
        let registry = registry();

        let missing = registry.call(SERVICE_SEND_MESSAGE, json!({})).await.unwrap_err();
        assert!(matches!(missing, ServiceError::InvalidData(_)));

        let wrong_type = registry
            .call(SERVICE_SEND_MESSAGE, json!({"message": 5}))
            .await
            .unwrap_err();
        assert!(matches!(wrong_type, ServiceError::InvalidData(_)));

        let empty = registry
            .call(SERVICE_SEND_MESSAGE, json!({"message": "   "}))
            .await
            .unwrap_err();
        assert!(matches!(empty, ServiceError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_run_task_rejects_non_object_data() {
        let err = registry()
            .call(SERVICE_RUN_TASK, json!(["water the plants"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidData(_)));
    }

    #[test]
    fn test_parse_data_accepts_null_for_empty_schemas() {
        #[derive(Deserialize)]
        struct Empty {}
        assert!(parse_data::<Empty>(Value::Null).is_ok());
    }
}
