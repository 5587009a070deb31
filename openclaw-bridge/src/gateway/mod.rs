//! HTTP client for the OpenClaw gateway.
//!
//! This module owns the HTTP contract with the gateway: bearer
//! authentication, request shaping for tool invocations and chat turns, and
//! classification of failures into [`crate::error::Error`].

mod client;
mod transport;

pub use client::{GatewayClient, Timeouts};
pub use transport::Transport;
