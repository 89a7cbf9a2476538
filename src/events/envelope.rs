//! Outbound message envelope: `{type, data, timestamp}`

use crate::cortex::CortexEvent;
use crate::error::ErrorResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Connected,
    ScanResult,
    TelemetryReceived,
    Pong,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(kind: EnvelopeKind, data: Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn connected(observer_id: u64) -> Self {
        Self::new(EnvelopeKind::Connected, json!({ "observer_id": observer_id }))
    }

    pub fn pong() -> Self {
        Self::new(EnvelopeKind::Pong, Value::Null)
    }

    pub fn error(error: impl Into<ErrorResponse>) -> Self {
        let error: ErrorResponse = error.into();
        Self::new(
            EnvelopeKind::Error,
            json!({ "code": error.code, "message": error.message }),
        )
    }

    pub fn from_event(event: &CortexEvent) -> Self {
        match event {
            CortexEvent::ScanCompleted(stats) => Self::new(EnvelopeKind::ScanResult, json!(stats)),
            CortexEvent::TelemetryRecorded(ev) => {
                Self::new(EnvelopeKind::TelemetryReceived, json!(ev))
            }
        }
    }

    /// Single-line JSON
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CortexError;

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(Envelope::pong()).unwrap();
        assert_eq!(value["type"], "pong");
        assert!(value["data"].is_null());
        assert!(value["timestamp"].is_string());

        let connected = serde_json::to_value(Envelope::connected(7)).unwrap();
        assert_eq!(connected["type"], "connected");
        assert_eq!(connected["data"]["observer_id"], 7);
    }

    #[test]
    fn test_error_envelope_carries_code() {
        let env = Envelope::error(CortexError::NodeNotFound("a.py:f".into()));
        assert_eq!(env.kind, EnvelopeKind::Error);
        assert_eq!(env.data["code"], "not_found");
        assert!(!env.to_line().unwrap().contains('\n'));
    }
}
