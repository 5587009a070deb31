//! HTTP client for the OpenClaw gateway.

use std::time::{Duration, Instant};

use openclaw_common::{
    ChatCompletionRequest, GatewayResponse, ToolInvocationRequest, DEFAULT_SESSION_KEY,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};

use super::Transport;

const TOOLS_INVOKE_PATH: &str = "/tools/invoke";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

const AGENT_ID_HEADER: &str = "x-openclaw-agent-id";
const SESSION_KEY_HEADER: &str = "x-openclaw-session-key";

/// Longest body excerpt carried by [`Error::Gateway`].
const MAX_ERROR_BODY: usize = 512;

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub tool: Duration,
    /// Chat turns may involve model inference, so they get more headroom.
    pub chat: Duration,
    pub health: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            tool: Duration::from_secs(15),
            chat: Duration::from_secs(45),
            health: Duration::from_secs(10),
        }
    }
}

/// Gateway HTTP client.
///
/// Issues tool invocations and chat completions against one gateway and
/// classifies every failure into [`Error`]. No retries happen here; the
/// coordinator's next tick is the retry.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    api_token: String,
    agent_id: String,
    timeouts: Timeouts,
    transport: Transport,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig, transport: Transport) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            agent_id: config.agent_id.clone(),
            timeouts: Timeouts::default(),
            transport,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Close the shared transport. Every later call fails with a connectivity error.
    pub fn close(&self) {
        self.transport.close();
    }

    /// POST /tools/invoke - run a named gateway tool.
    pub async fn invoke_tool(
        &self,
        tool: &str,
        args: Map<String, Value>,
        session_key: Option<&str>,
    ) -> Result<GatewayResponse> {
        self.invoke_tool_with_timeout(tool, args, session_key, self.timeouts.tool)
            .await
    }

    async fn invoke_tool_with_timeout(
        &self,
        tool: &str,
        args: Map<String, Value>,
        session_key: Option<&str>,
        timeout: Duration,
    ) -> Result<GatewayResponse> {
        let mut body = ToolInvocationRequest::new(tool, args);
        if let Some(key) = session_key {
            body = body.with_session_key(key);
        }

        tracing::debug!(tool = %tool, "Invoking gateway tool");
        let request = self.post(TOOLS_INVOKE_PATH, &body, timeout);
        self.execute(request).await
    }

    /// POST /v1/chat/completions - send one user turn to the configured agent.
    pub async fn chat(&self, text: &str, session_key: Option<&str>) -> Result<GatewayResponse> {
        let body = ChatCompletionRequest::user_turn(&self.agent_id, text);

        let mut request = self.post(CHAT_COMPLETIONS_PATH, &body, self.timeouts.chat);
        if let Some(key) = session_key {
            request = request.header(SESSION_KEY_HEADER, key);
        }

        tracing::debug!(model = %body.model, "Sending chat turn to gateway");
        self.execute(request).await
    }

    /// Current session status, polled by the coordinator.
    pub async fn status(&self) -> Result<GatewayResponse> {
        self.invoke_tool("session_status", Map::new(), Some(DEFAULT_SESSION_KEY))
            .await
    }

    /// Cheap, side-effect-free call used to validate connectivity and credentials.
    pub async fn health(&self) -> Result<GatewayResponse> {
        let args = match json!({"limit": 1, "messageLimit": 0}) {
            Value::Object(args) => args,
            _ => Map::new(),
        };
        self.invoke_tool_with_timeout(
            "sessions_list",
            args,
            Some(DEFAULT_SESSION_KEY),
            self.timeouts.health,
        )
        .await
    }

    pub async fn send_message(&self, message: &str) -> Result<GatewayResponse> {
        self.chat(message, None).await
    }

    pub async fn run_task(&self, task: &str) -> Result<GatewayResponse> {
        self.chat(task, None).await
    }

    fn post<B: Serialize>(&self, path: &str, body: &B, timeout: Duration) -> RequestBuilder {
        self.transport
            .http()
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_token)
            .header(AGENT_ID_HEADER, &self.agent_id)
            .timeout(timeout)
            .json(body)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<GatewayResponse> {
        let started = Instant::now();
        let result = self
            .transport
            .guard(async {
                let response = request.send().await.map_err(Error::from_transport)?;
                Self::parse(response).await
            })
            .await;

        match &result {
            Ok(_) => tracing::debug!(
                elapsed_ms = %started.elapsed().as_millis(),
                "Gateway call succeeded"
            ),
            Err(e) => tracing::debug!(
                elapsed_ms = %started.elapsed().as_millis(),
                "Gateway call failed: {}",
                e
            ),
        }
        result
    }

    async fn parse(response: Response) -> Result<GatewayResponse> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                status: status.as_u16(),
            });
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Gateway {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        response.json().await.map_err(Error::from_transport)
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
