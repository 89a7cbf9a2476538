//! Thread-safe hand-off from the synchronous Cortex to the async bus

use crate::cortex::{Cortex, CortexEvent, SubscriptionId};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct EventBridge {
    tx: mpsc::Sender<CortexEvent>,
}

impl EventBridge {
    /// The receiver goes to `EventBus::run`
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CortexEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Callable from any thread; returns false when the event was dropped
    pub fn publish(&self, event: CortexEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event bridge full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Forward every Cortex event into the bridge
pub fn attach(cortex: &Cortex, bridge: &EventBridge) -> SubscriptionId {
    let bridge = bridge.clone();
    cortex.subscribe(move |event| {
        bridge.publish(event.clone());
    })
}
