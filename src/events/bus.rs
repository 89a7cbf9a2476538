//! Live observer set and fan-out

use super::envelope::Envelope;
use crate::cortex::CortexEvent;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub type ObserverId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Outbound queue is full; this message is lost for that observer
    #[error("observer queue full")]
    Full,
    /// Receiving side is gone
    #[error("observer closed")]
    Closed,
}

/// A connected peer. `send` must never block.
pub trait Observer: Send + Sync {
    fn send(&self, line: Arc<str>) -> Result<(), DeliveryError>;
}

/// Observer backed by a bounded channel; the receiver is drained by a writer task
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelObserver {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Direct reply to this peer; waits for queue space instead of dropping
    pub async fn reply(&self, line: Arc<str>) -> Result<(), DeliveryError> {
        self.tx.send(line).await.map_err(|_| DeliveryError::Closed)
    }
}

impl Observer for ChannelObserver {
    fn send(&self, line: Arc<str>) -> Result<(), DeliveryError> {
        self.tx.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

#[derive(Default)]
pub struct EventBus {
    observers: DashMap<ObserverId, Arc<dyn Observer>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Register an observer and greet it with a `connected` envelope
    pub fn connect(&self, observer: Arc<dyn Observer>) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        match Envelope::connected(id).to_line() {
            Ok(line) => {
                if let Err(e) = observer.send(line.into()) {
                    warn!("Observer {} failed on connect: {}", id, e);
                }
            }
            Err(e) => error!("Failed to serialize connected envelope: {}", e),
        }
        self.observers.insert(id, observer);
        debug!("Observer {} connected ({} total)", id, self.observers.len());
        id
    }

    pub fn disconnect(&self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    /// Send one envelope to every observer; returns how many accepted it.
    /// Closed observers are removed after the pass.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        let line: Arc<str> = match envelope.to_line() {
            Ok(line) => line.into(),
            Err(e) => {
                error!("Failed to serialize {:?} envelope: {}", envelope.kind, e);
                return 0;
            }
        };

        let targets: Vec<(ObserverId, Arc<dyn Observer>)> = self
            .observers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, observer) in targets {
            match observer.send(Arc::clone(&line)) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Full) => {
                    warn!("Observer {} is not keeping up; dropped {:?}", id, envelope.kind)
                }
                Err(DeliveryError::Closed) => closed.push(id),
            }
        }

        for id in closed {
            self.observers.remove(&id);
            debug!("Observer {} removed", id);
        }
        delivered
    }

    /// Drain Cortex events into broadcasts until every sender is dropped
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<CortexEvent>) {
        info!("Event bus running");
        while let Some(event) = events.recv().await {
            let envelope = Envelope::from_event(&event);
            let n = self.broadcast(&envelope);
            debug!("Broadcast {:?} to {} observers", envelope.kind, n);
        }
        info!("Event bus stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EnvelopeKind;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        lines: Mutex<Vec<String>>,
    }

    impl Observer for Recording {
        fn send(&self, line: Arc<str>) -> Result<(), DeliveryError> {
            self.lines.lock().push(line.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_connect_sends_connected_first() {
        let bus = EventBus::new();
        let rec = Arc::new(Recording::default());
        let id = bus.connect(rec.clone());
        let lines = rec.lines.lock();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"connected\""));
        assert!(lines[0].contains(&format!("\"observer_id\":{}", id)));
    }

    #[test]
    fn test_closed_observer_is_removed() {
        let bus = EventBus::new();
        let live = Arc::new(Recording::default());
        bus.connect(live.clone());

        let (gone, rx) = ChannelObserver::new(4);
        bus.connect(Arc::new(gone));
        drop(rx);
        assert_eq!(bus.observer_count(), 2);

        let delivered = bus.broadcast(&Envelope::pong());
        assert_eq!(delivered, 1);
        assert_eq!(bus.observer_count(), 1);
        assert_eq!(live.lines.lock().len(), 2);
    }

    #[test]
    fn test_full_observer_is_kept() {
        let bus = EventBus::new();
        let (slow, mut rx) = ChannelObserver::new(1);
        bus.connect(Arc::new(slow));

        // queue already holds the connected envelope
        assert_eq!(bus.broadcast(&Envelope::pong()), 0);
        assert_eq!(bus.observer_count(), 1);

        assert!(rx.try_recv().unwrap().contains("connected"));
        assert_eq!(bus.broadcast(&Envelope::pong()), 1);
    }

    #[tokio::test]
    async fn test_run_forwards_events() {
        let bus = Arc::new(EventBus::new());
        let (observer, mut rx) = ChannelObserver::new(8);
        bus.connect(Arc::new(observer));
        let _ = rx.recv().await;

        let (tx, events) = mpsc::channel(4);
        let handle = tokio::spawn(Arc::clone(&bus).run(events));

        let event = crate::models::TelemetryEvent {
            id: "e1".into(),
            node_id: "a.py:f".into(),
            event_type: crate::models::TelemetryEventType::Warning,
            metadata: Default::default(),
            session_id: None,
            timestamp: chrono::Utc::now(),
        };
        tx.send(CortexEvent::TelemetryRecorded(event)).await.unwrap();
        drop(tx);

        let line = rx.recv().await.unwrap();
        let env: Envelope = serde_json::from_str(&line).unwrap();
        assert_eq!(env.kind, EnvelopeKind::TelemetryReceived);
        assert_eq!(env.data["node_id"], "a.py:f");
        handle.await.unwrap();
    }
}
