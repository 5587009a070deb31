//! OpenAI-compatible chat completion body as accepted by the gateway.

use serde::{Deserialize, Serialize};

/// Product prefix of the model identifier, `openclaw:<agent_id>`.
pub const MODEL_PREFIX: &str = "openclaw";

/// Fixed caller identifier sent in the `user` field.
pub const CHAT_CALLER: &str = "homeassistant";

/// Chat completion request sent to `/v1/chat/completions`.
///
/// Streaming is never requested; the gateway answers with one JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl ChatCompletionRequest {
    /// Build a single user turn addressed to the given agent.
    pub fn user_turn(agent_id: &str, text: impl Into<String>) -> Self {
        Self {
            model: format!("{}:{}", MODEL_PREFIX, agent_id),
            messages: vec![ChatMessage::user(text)],
            stream: false,
            user: CHAT_CALLER.to_string(),
        }
    }
}
