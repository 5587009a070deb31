//! Sensor presentation.
//!
//! Projects the coordinator snapshot onto the named sensors the host shows.
//! Sensors only read the snapshot; they never touch the gateway.

use openclaw_common::GatewayMetrics;
use serde::Serialize;
use serde_json::Value;

use crate::coordinator::Snapshot;

/// Device every sensor is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: &'static str,
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

pub const GATEWAY_DEVICE: DeviceInfo = DeviceInfo {
    identifier: "gateway",
    name: "OpenClaw Gateway",
    manufacturer: "OpenClaw",
    model: "Gateway",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Status,
    ActiveSessions,
    UsageTokens,
    Cost,
    Uptime,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Status,
        SensorKind::ActiveSessions,
        SensorKind::UsageTokens,
        SensorKind::Cost,
        SensorKind::Uptime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Status => "Status",
            SensorKind::ActiveSessions => "Active sessions",
            SensorKind::UsageTokens => "Usage tokens",
            SensorKind::Cost => "Cost estimate",
            SensorKind::Uptime => "Uptime seconds",
        }
    }

    pub fn unique_id(&self) -> &'static str {
        match self {
            SensorKind::Status => "openclaw_status",
            SensorKind::ActiveSessions => "openclaw_active_sessions",
            SensorKind::UsageTokens => "openclaw_usage_tokens",
            SensorKind::Cost => "openclaw_cost_estimate",
            SensorKind::Uptime => "openclaw_uptime_seconds",
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            SensorKind::Status => None,
            SensorKind::ActiveSessions => Some("mdi:account-multiple"),
            SensorKind::UsageTokens => Some("mdi:counter"),
            SensorKind::Cost => Some("mdi:currency-eur"),
            SensorKind::Uptime => Some("mdi:timer-outline"),
        }
    }

    pub fn unit_of_measurement(&self) -> Option<&'static str> {
        match self {
            SensorKind::Uptime => Some("s"),
            _ => None,
        }
    }

    pub fn state_class(&self) -> Option<&'static str> {
        match self {
            SensorKind::Uptime => Some("measurement"),
            _ => None,
        }
    }

    /// Render this sensor from the current snapshot.
    pub fn render(&self, snapshot: &Snapshot) -> SensorState {
        let value = match self {
            SensorKind::Status => Some(Value::from(if snapshot.last_update_success {
                "online"
            } else {
                "offline"
            })),
            _ => {
                let metrics = snapshot
                    .data
                    .as_deref()
                    .map(GatewayMetrics::from_response)
                    .unwrap_or_default();
                self.pick(metrics)
            }
        };

        SensorState {
            kind: *self,
            unique_id: self.unique_id(),
            value,
            unit_of_measurement: self.unit_of_measurement(),
            available: snapshot.last_update_success,
            device: GATEWAY_DEVICE,
        }
    }

    fn pick(&self, metrics: GatewayMetrics) -> Option<Value> {
        match self {
            SensorKind::Status => None,
            SensorKind::ActiveSessions => Some(metrics.active_sessions),
            SensorKind::UsageTokens => metrics.usage_tokens,
            SensorKind::Cost => metrics.cost,
            SensorKind::Uptime => metrics.uptime,
        }
    }
}

/// Rendered value of one sensor, serialized as the host-facing state record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub kind: SensorKind,
    pub unique_id: &'static str,
    pub value: Option<Value>,
    pub unit_of_measurement: Option<&'static str>,
    pub available: bool,
    pub device: DeviceInfo,
}

/// Render every sensor from the snapshot.
pub fn render_all(snapshot: &Snapshot) -> Vec<SensorState> {
    SensorKind::ALL.iter().map(|kind| kind.render(snapshot)).collect()
}
