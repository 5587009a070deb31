//! OpenClaw Common Types
//!
//! Shared types used by anything that talks to an OpenClaw gateway: request
//! bodies for tool invocations and chat completions, plus defensive
//! extraction of status metrics from the gateway's untyped responses.

pub mod chat;
pub mod metrics;
pub mod tool;

pub use chat::{ChatCompletionRequest, ChatMessage, CHAT_CALLER, MODEL_PREFIX};
pub use metrics::{data_root, first_present, GatewayMetrics};
pub use tool::{GatewayResponse, ToolInvocationRequest, DEFAULT_SESSION_KEY};
