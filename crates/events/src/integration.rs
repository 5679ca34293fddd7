use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use adhelm_core::OrganizationId;

use crate::event::Event;

/// Severity of an audit-trail entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Append-only audit record of a decision or action the engine took.
///
/// Campaign snapshots are overwritten every cycle; this stream is the
/// durable history. `category` names the action
/// (e.g. "budget.cycle_decided", "budget.executed", "anomaly.detected")
/// and `metadata` carries the category-specific structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEvent {
    pub event_id: Uuid,
    pub organization_id: OrganizationId,
    pub category: String,
    pub severity: Severity,
    pub message: String,
    pub metadata: JsonValue,
    pub occurred_at: DateTime<Utc>,
}

impl IntegrationEvent {
    pub fn new(
        organization_id: OrganizationId,
        category: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            organization_id,
            category: category.into(),
            severity,
            message: message.into(),
            metadata: JsonValue::Null,
            occurred_at,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Event for IntegrationEvent {
    fn event_type(&self) -> &'static str {
        "integration.audit"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_round_trips() {
        let ev = IntegrationEvent::new(
            OrganizationId::new(),
            "budget.cycle_decided",
            Severity::Warning,
            "3 decisions (oracle 0, fallback 3)",
            Utc::now(),
        )
        .with_metadata(json!({ "decided": 3, "fallback": 3 }));

        let roundtrip: IntegrationEvent =
            serde_json::from_str(&serde_json::to_string(&ev).unwrap()).unwrap();
        assert_eq!(roundtrip, ev);
        assert_eq!(roundtrip.metadata["fallback"], 3);
    }
}
