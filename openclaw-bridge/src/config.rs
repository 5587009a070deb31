//! Configuration for the OpenClaw bridge.

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Allowed range for the poll interval, in seconds.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 5;
pub const MAX_SCAN_INTERVAL_SECS: u64 = 3600;

/// Main configuration structure: one gateway entry plus its options.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection data collected at setup time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayConfig {
    /// Gateway base URL, e.g. `https://gw.example/api`.
    pub base_url: String,
    pub api_token: String,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
}

/// Options that can change after setup. Changing them reloads the integration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionsConfig {
    /// Poll interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    /// Overrides `gateway.agent_id` when set.
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            agent_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Default values
pub fn default_agent_id() -> String {
    "main".to_string()
}
fn default_scan_interval() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (OPENCLAW__SECTION__KEY format)
    /// 2. openclaw.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?.add_source(File::with_name("openclaw").required(false));
        Self::finish(builder)
    }

    /// Same as [`Config::load`], but the file at `path` must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Self::defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(ConfigLoader::builder()
            .set_default("gateway.agent_id", default_agent_id())?
            .set_default("options.scan_interval", default_scan_interval() as i64)?
            .set_default("logging.level", default_log_level())?)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder
            .add_source(
                Environment::with_prefix("OPENCLAW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints the setup form enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        self.options.validate()
    }

    /// Agent id in effect: the options override, else the entry's value.
    pub fn effective_agent_id(&self) -> &str {
        self.options
            .agent_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&self.gateway.agent_id)
    }

    /// Connection data with the options override applied.
    pub fn connection(&self) -> GatewayConfig {
        GatewayConfig {
            agent_id: self.effective_agent_id().to_string(),
            ..self.gateway.clone()
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.options.scan_interval)
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::Invalid("api_token is required".to_string()));
        }
        if self.agent_id.trim().is_empty() {
            return Err(ConfigError::Invalid("agent_id must not be empty".to_string()));
        }
        Ok(())
    }
}

impl OptionsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SCAN_INTERVAL_SECS..=MAX_SCAN_INTERVAL_SECS).contains(&self.scan_interval) {
            return Err(ConfigError::Invalid(format!(
                "scan_interval must be between {} and {} seconds, got {}",
                MIN_SCAN_INTERVAL_SECS, MAX_SCAN_INTERVAL_SECS, self.scan_interval
            )));
        }
        Ok(())
    }
}
