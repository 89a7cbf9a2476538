//! Append-only telemetry log

use crate::models::TelemetryEvent;

#[derive(Debug, Default)]
pub struct TelemetryLog {
    events: Vec<TelemetryEvent>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TelemetryEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Up to `limit` events, newest first, optionally for one node
    pub fn recent(&self, node_id: Option<&str>, limit: usize) -> Vec<TelemetryEvent> {
        self.events
            .iter()
            .rev()
            .filter(|e| node_id.map_or(true, |id| e.node_id == id))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TelemetryEventType;
    use chrono::Utc;
    use std::collections::HashMap;

    fn event(n: usize, node: &str) -> TelemetryEvent {
        TelemetryEvent {
            id: format!("ev-{}", n),
            node_id: node.to_string(),
            event_type: TelemetryEventType::Execution,
            metadata: HashMap::new(),
            session_id: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut log = TelemetryLog::new();
        for i in 0..5 {
            log.push(event(i, if i % 2 == 0 { "a.py:f" } else { "a.py:g" }));
        }
        let ids: Vec<_> = log.recent(None, 3).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["ev-4", "ev-3", "ev-2"]);

        let only_f: Vec<_> = log
            .recent(Some("a.py:f"), 10)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(only_f, vec!["ev-4", "ev-2", "ev-0"]);
        assert!(log.recent(None, 0).is_empty());
        assert_eq!(log.len(), 5);
    }
}
