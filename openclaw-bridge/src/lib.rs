//! OpenClaw Bridge
//!
//! Connects a home-automation host to an OpenClaw gateway: authenticates
//! over HTTP, polls status on an interval, exposes sensor values derived from
//! that status, and forwards user commands to the gateway.

pub mod config;
pub mod config_flow;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod integration;
pub mod sensor;
pub mod services;

pub use config::{Config, GatewayConfig, OptionsConfig};
pub use coordinator::{Coordinator, CoordinatorState, SetupError, Snapshot, UpdateFailure};
pub use error::{Error, Result};
pub use gateway::{GatewayClient, Timeouts, Transport};
pub use integration::Integration;
pub use sensor::{SensorKind, SensorState};
pub use services::{ServiceError, ServiceRegistry};
