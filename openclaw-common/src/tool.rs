//! Generic tool invocation body for `/tools/invoke`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session scope used by the status and health calls.
pub const DEFAULT_SESSION_KEY: &str = "main";

/// Whatever JSON the gateway returned.
///
/// The gateway's response shape is not contractually stable, so it is kept
/// opaque and probed defensively by consumers (see [`crate::metrics`]).
pub type GatewayResponse = Value;

/// Request body for a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(
        rename = "sessionKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_key: Option<String>,
}

impl ToolInvocationRequest {
    pub fn new(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
            session_key: None,
        }
    }

    pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }
}
