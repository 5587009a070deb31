//! OpenClaw Bridge - polls an OpenClaw gateway and forwards commands to it.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use openclaw_bridge::config_flow;
use openclaw_bridge::{Config, Integration, SetupError};

#[derive(Debug, Parser)]
#[command(name = "openclaw-bridge", version, about = "Polls an OpenClaw gateway and forwards commands to it")]
struct Cli {
    /// Configuration file. Defaults to ./openclaw.toml when present.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// Poll the gateway until interrupted (default).
    Run,
    /// Check the configured credentials against the gateway.
    Validate,
    /// Run one command and print the gateway's reply.
    Call {
        /// Command name, e.g. send_message.
        service: String,
        /// Command data as a JSON object.
        data: Option<String>,
    },
}

/// Parse optional command data; absent means `null`.
fn parse_data(data: Option<&str>) -> Result<Value, String> {
    match data {
        Some(data) => serde_json::from_str(data).map_err(|e| format!("invalid JSON data: {}", e)),
        None => Ok(Value::Null),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    loaded.map_err(|e| {
        format!(
            "{}. Make sure openclaw.toml exists or set OPENCLAW__GATEWAY__BASE_URL and \
             OPENCLAW__GATEWAY__API_TOKEN environment variables.",
            e
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config, cli.config).await,
        Command::Validate => validate(&config).await,
        Command::Call { service, data } => {
            let data = parse_data(data.as_deref())?;
            call(config, &service, data).await
        }
    }
}

/// Check credentials the way the setup form does.
async fn validate(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match config_flow::validate_input(&config.connection()).await {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(e) => {
            println!("{}", e.code());
            Err(e.into())
        }
    }
}

/// Set up, run one command, tear down.
async fn call(config: Config, service: &str, data: Value) -> Result<(), Box<dyn std::error::Error>> {
    let integration = Integration::setup(config).await?;
    let result = integration.call(service, data).await;
    integration.unload();

    match result? {
        Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
        None => println!("ok"),
    }
    Ok(())
}

async fn run(config: Config, config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(mut integration) = setup_until_ready(config).await? else {
        return Ok(());
    };
    log_sensors(&integration);

    let mut reload_signal = ReloadSignal::new()?;
    let mut updates = integration.coordinator().subscribe();
    let mut available = integration.snapshot().last_update_success;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let now_available = integration.snapshot().last_update_success;
                if now_available != available {
                    tracing::info!(
                        "Gateway is {}",
                        if now_available { "online" } else { "offline" }
                    );
                    available = now_available;
                }
                log_sensors(&integration);
            }
            _ = reload_signal.recv() => {
                let config = match load_config(config_path.as_deref()) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::error!("Keeping current configuration: {}", e);
                        continue;
                    }
                };
                tracing::info!("Configuration changed, reloading");
                integration.unload();
                integration = match setup_until_ready(config).await? {
                    Some(integration) => integration,
                    None => return Ok(()),
                };
                updates = integration.coordinator().subscribe();
                available = integration.snapshot().last_update_success;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    integration.unload();
    Ok(())
}

/// Set up the integration, retrying while the gateway is not ready.
///
/// Returns `None` if interrupted before setup succeeded. Authentication and
/// configuration errors are not retried.
async fn setup_until_ready(config: Config) -> Result<Option<Integration>, SetupError> {
    let retry_delay = config.scan_interval();
    loop {
        match Integration::setup(config.clone()).await {
            Ok(integration) => return Ok(Some(integration)),
            Err(SetupError::NotReady(reason)) => {
                tracing::warn!(
                    "Gateway not ready ({}), retrying in {} seconds",
                    reason,
                    retry_delay.as_secs()
                );
            }
            Err(e) => return Err(e),
        }

        tokio::select! {
            _ = tokio::time::sleep(retry_delay) => {}
            _ = tokio::signal::ctrl_c() => return Ok(None),
        }
    }
}

fn log_sensors(integration: &Integration) {
    for state in integration.sensors() {
        match serde_json::to_string(&state) {
            Ok(record) => tracing::debug!(sensor = state.unique_id, "{}", record),
            Err(e) => tracing::warn!(sensor = state.unique_id, "Failed to encode sensor state: {}", e),
        }
    }
}

/// SIGHUP triggers a configuration reload on unix.
#[cfg(unix)]
struct ReloadSignal(tokio::signal::unix::Signal);

#[cfg(unix)]
impl ReloadSignal {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self(signal(SignalKind::hangup())?))
    }

    async fn recv(&mut self) {
        self.0.recv().await;
    }
}

#[cfg(not(unix))]
struct ReloadSignal;

#[cfg(not(unix))]
impl ReloadSignal {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_defaults_to_run() {
        let cli = Cli::try_parse_from(["openclaw-bridge"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_config_and_validate() {
        let cli = Cli::try_parse_from(["openclaw-bridge", "--config", "/etc/openclaw.toml", "validate"])
            .unwrap();
        assert_eq!(cli.command, Some(Command::Validate));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/openclaw.toml")));

        // Global flag is accepted after the subcommand too.
        let cli = Cli::try_parse_from(["openclaw-bridge", "run", "-c", "bridge.toml"]).unwrap();
        assert_eq!(cli.command, Some(Command::Run));
        assert_eq!(cli.config, Some(PathBuf::from("bridge.toml")));
    }

    #[test]
    fn test_parse_call_with_data() {
        let cli = Cli::try_parse_from([
            "openclaw-bridge",
            "call",
            "send_message",
            r#"{"message":"hi"}"#,
        ])
        .unwrap();
        let Some(Command::Call { service, data }) = cli.command else {
            panic!("expected call command");
        };
        assert_eq!(service, "send_message");
        assert_eq!(parse_data(data.as_deref()).unwrap(), json!({"message": "hi"}));

        assert_eq!(parse_data(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["openclaw-bridge", "--config"]).is_err());
        assert!(Cli::try_parse_from(["openclaw-bridge", "dance"]).is_err());
        assert!(Cli::try_parse_from(["openclaw-bridge", "call"]).is_err());
        assert!(parse_data(Some("{not json")).is_err());
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["openclaw-bridge", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
