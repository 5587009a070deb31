//! Credential validation for setup, reauth and options changes.

use crate::config::{GatewayConfig, OptionsConfig};
use crate::error::Error;
use crate::gateway::{GatewayClient, Timeouts, Transport};

/// Outcome shown to the user when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid authentication")]
    InvalidAuth,

    #[error("Cannot connect: {0}")]
    CannotConnect(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FlowError {
    /// Form error code, as used by the host's translations.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::InvalidAuth => "invalid_auth",
            FlowError::CannotConnect(_) => "cannot_connect",
            FlowError::Unknown(_) => "unknown",
        }
    }
}

/// Check the connection data by issuing one health call.
///
/// Uses a throwaway transport that is closed whatever the outcome.
pub async fn validate_input(config: &GatewayConfig) -> Result<(), FlowError> {
    validate_input_with(config, Timeouts::default()).await
}

pub async fn validate_input_with(config: &GatewayConfig, timeouts: Timeouts) -> Result<(), FlowError> {
    config
        .validate()
        .map_err(|e| FlowError::Unknown(e.to_string()))?;

    let transport = Transport::new();
    let client = GatewayClient::new(config, transport.clone()).with_timeouts(timeouts);
    let result = client.health().await;
    transport.close();

    match result {
        Ok(_) => {
            tracing::info!("Validated gateway credentials for {}", client.base_url());
            Ok(())
        }
        Err(Error::Authentication { .. }) => Err(FlowError::InvalidAuth),
        Err(e) => Err(FlowError::CannotConnect(e.to_string())),
    }
}

/// Replace the token of an existing entry and validate the result.
///
/// Returns the merged connection data for the caller to persist and reload.
pub async fn reauth(existing: &GatewayConfig, api_token: &str) -> Result<GatewayConfig, FlowError> {
    reauth_with(existing, api_token, Timeouts::default()).await
}

pub async fn reauth_with(
    existing: &GatewayConfig,
    api_token: &str,
    timeouts: Timeouts,
) -> Result<GatewayConfig, FlowError> {
    let merged = GatewayConfig {
        api_token: api_token.to_string(),
        ..existing.clone()
    };
    validate_input_with(&merged, timeouts).await?;
    Ok(merged)
}

/// Options form: range-check the poll interval.
pub fn validate_options(options: &OptionsConfig) -> Result<(), FlowError> {
    options
        .validate()
        .map_err(|e| FlowError::Unknown(e.to_string()))
}
