//! Defensive extraction of status metrics from gateway responses.
//!
//! The gateway has changed its status payload between releases, so every
//! metric is looked up through an ordered list of candidate keys. The first
//! key that is present and not `null` wins.

use serde_json::{Map, Value};

/// Candidate keys for the number of active sessions.
pub const ACTIVE_SESSIONS_KEYS: &[&str] = &["activeSessions", "sessions", "sessionCount"];

/// Candidate keys for token usage, looked up inside the `usage` object.
pub const USAGE_TOKENS_KEYS: &[&str] = &["totalTokens", "tokens", "inputTokens", "outputTokens"];

/// Candidate keys for cost, looked up inside the `usage` object.
pub const COST_KEYS: &[&str] = &["cost", "totalCost", "estimatedCost"];

/// Candidate keys for gateway uptime in seconds.
pub const UPTIME_KEYS: &[&str] = &["uptimeSec", "uptimeSeconds", "uptime"];

/// Return the object holding the metrics.
///
/// Tool invocations wrap their payload in `result`; if that is an object it
/// is used, otherwise the top level is. Non-object responses yield `None`.
pub fn data_root(response: &Value) -> Option<&Map<String, Value>> {
    let top = response.as_object()?;
    match top.get("result") {
        Some(Value::Object(result)) => Some(result),
        _ => Some(top),
    }
}

/// Return the value of the first candidate key that is present and not null.
pub fn first_present<'a>(map: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// Metrics projected from one status response.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayMetrics {
    /// Active session count, `0` when the gateway reports none.
    pub active_sessions: Value,
    pub usage_tokens: Option<Value>,
    pub cost: Option<Value>,
    pub uptime: Option<Value>,
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self {
            active_sessions: Value::from(0),
            usage_tokens: None,
            cost: None,
            uptime: None,
        }
    }
}

impl GatewayMetrics {
    pub fn from_response(response: &Value) -> Self {
        let Some(root) = data_root(response) else {
            return Self::default();
        };

        let usage = match root.get("usage") {
            Some(Value::Object(usage)) => Some(usage),
            _ => None,
        };
        let from_usage =
            |keys: &[&str]| usage.and_then(|u| first_present(u, keys)).cloned();

        Self {
            active_sessions: first_present(root, ACTIVE_SESSIONS_KEYS)
                .cloned()
                .unwrap_or_else(|| Value::from(0)),
            usage_tokens: from_usage(USAGE_TOKENS_KEYS),
            cost: from_usage(COST_KEYS),
            uptime: first_present(root, UPTIME_KEYS).cloned(),
        }
    }
}
