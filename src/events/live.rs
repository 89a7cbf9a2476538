//! Live channel over stdio
//!
//! Inbound lines are `{"action": "scan" | "telemetry" | "ping", ...}`.
//! Scan and telemetry results reach every observer through the bus as
//! `scan_result` / `telemetry_received`; `pong` and `error` go only to the
//! peer that asked.

use super::bridge::{attach, EventBridge};
use super::bus::{ChannelObserver, EventBus};
use super::envelope::Envelope;
use crate::cortex::Cortex;
use crate::error::{CortexError, Result};
use crate::models::TelemetryRecord;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LiveRequest {
    Scan {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Telemetry(TelemetryRecord),
    Ping,
}

/// Handle one inbound line; `Some` is a direct reply for the sender only
pub async fn handle_request(cortex: &Arc<Cortex>, line: &str) -> Option<Envelope> {
    let request: LiveRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return Some(Envelope::error(CortexError::Json(e))),
    };
    debug!("Live request: {:?}", request);

    match request {
        LiveRequest::Ping => Some(Envelope::pong()),
        LiveRequest::Scan { path } => {
            let cortex = Arc::clone(cortex);
            let path = path.unwrap_or_else(|| PathBuf::from("."));
            let result = tokio::task::spawn_blocking(move || cortex.scan(&path))
                .await
                .map_err(|e| CortexError::Tool(format!("scan task failed: {}", e)))
                .and_then(|r| r);
            result.err().map(Envelope::error)
        }
        LiveRequest::Telemetry(record) => cortex.record(record).err().map(Envelope::error),
    }
}

/// Serve the live channel on stdin/stdout until stdin closes
pub async fn run_stdio(cortex: Arc<Cortex>) -> Result<()> {
    let events = cortex.config().events.clone();

    let bus = Arc::new(EventBus::new());
    let (bridge, event_rx) = EventBridge::new(events.bridge_capacity);
    let subscription = attach(&cortex, &bridge);
    let bus_task = tokio::spawn(Arc::clone(&bus).run(event_rx));

    let (observer, mut outbound) = ChannelObserver::new(events.observer_capacity);
    let observer = Arc::new(observer);
    let observer_id = bus.connect(observer.clone());

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = outbound.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                break;
            }
        }
    });

    info!("Live channel ready on stdio");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = handle_request(&cortex, &line).await {
            let sent = match reply.to_line() {
                Ok(l) => observer.reply(l.into()).await.is_ok(),
                Err(_) => false,
            };
            if !sent {
                warn!("Could not deliver {:?} reply", reply.kind);
            }
        }
    }

    cortex.unsubscribe(subscription);
    drop(bridge);
    if let Err(e) = bus_task.await {
        warn!("Event bus task ended abnormally: {}", e);
    }
    bus.disconnect(observer_id);
    drop(observer);
    let _ = writer.await;
    info!("Live channel closed");
    Ok(())
}
