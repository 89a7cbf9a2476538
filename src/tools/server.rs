//! Tool server over stdio
//!
//! Reads one `ToolRequest` per line from stdin and writes one `ToolResponse`
//! per line to stdout. Query failures come back as `error` objects; only
//! transport failures end the loop.

use super::params::*;
use super::protocol::{ToolRequest, ToolResponse};
use crate::cortex::{Cortex, MAX_IMPACT_DEPTH};
use crate::error::{CortexError, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::{debug, error, info};

const DEFAULT_IMPACT_DEPTH: usize = 3;
const DEFAULT_SEARCH_LIMIT: usize = 20;
const DEFAULT_TELEMETRY_LIMIT: usize = 50;
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Method names served, in listing order
pub const METHODS: &[&str] = &[
    "scan",
    "refresh",
    "graph",
    "hierarchy",
    "health",
    "impact",
    "search",
    "metrics",
    "smells",
    "cycles",
    "telemetry.record",
    "telemetry.read",
    "history",
    "audit",
];

pub struct ToolServer {
    cortex: Arc<Cortex>,
}

impl ToolServer {
    pub fn new(cortex: Arc<Cortex>) -> Self {
        Self { cortex }
    }

    /// Serve until stdin closes
    pub fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        info!("Cortex tool server started ({} methods)", METHODS.len());

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            let response = self.handle_line(&line);
            let response_str = serde_json::to_string(&response)?;
            debug!("Sending: {}", response_str);
            writeln!(stdout, "{}", response_str)?;
            stdout.flush()?;
        }

        info!("Tool server input closed");
        Ok(())
    }

    pub fn handle_line(&self, line: &str) -> ToolResponse {
        let request: ToolRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                error!("Invalid tool request: {}", e);
                return ToolResponse::err(Value::Null, &CortexError::Json(e));
            }
        };

        match self.dispatch(&request.method, request.params) {
            Ok(value) => ToolResponse::ok(request.id, value),
            Err(e) => {
                debug!("{} failed: {}", request.method, e);
                ToolResponse::err(request.id, &e)
            }
        }
    }

    pub fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        let cortex = &self.cortex;
        let value = match method {
            "scan" => {
                let p: ScanParams = parse(method, params)?;
                let path = p.path.unwrap_or_else(|| ".".into());
                json!(cortex.scan(&path)?)
            }
            "refresh" => json!(cortex.refresh()?),
            "audit" => json!(cortex.audit()?),
            "graph" => json!(cortex.graph_export()),
            "hierarchy" => {
                let p: NodeParams = parse(method, params)?;
                json!(cortex.hierarchy(&p.node_id)?)
            }
            "health" => {
                let p: HealthParams = parse(method, params)?;
                json!(cortex.health_report(p.top_n))
            }
            "impact" => {
                let p: ImpactParams = parse(method, params)?;
                let depth = p.depth.unwrap_or(DEFAULT_IMPACT_DEPTH);
                if !(1..=MAX_IMPACT_DEPTH).contains(&depth) {
                    return Err(CortexError::InvalidInput(format!(
                        "depth must be between 1 and {}, got {}",
                        MAX_IMPACT_DEPTH, depth
                    )));
                }
                json!(cortex.impact(&p.node_id, depth)?)
            }
            "search" => {
                let p: SearchParams = parse(method, params)?;
                let limit = p.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
                json!(cortex.search(&p.query, p.kind, limit)?)
            }
            "metrics" => {
                let p: NodeParams = parse(method, params)?;
                json!({
                    "node_id": p.node_id,
                    "metrics": cortex.metrics(&p.node_id)?,
                    "risk": cortex.risk(&p.node_id)?,
                })
            }
            "smells" => {
                let p: SmellsParams = parse(method, params)?;
                json!(cortex.smells(p.severity))
            }
            "cycles" => json!(cortex.cycles()),
            "telemetry.record" => json!(cortex.record(parse(method, params)?)?),
            "telemetry.read" => {
                let p: TelemetryReadParams = parse(method, params)?;
                let limit = p.limit.unwrap_or(DEFAULT_TELEMETRY_LIMIT);
                json!(cortex.telemetry(p.node_id.as_deref(), limit))
            }
            "history" => {
                let p: HistoryParams = parse(method, params)?;
                json!(cortex.scan_history(p.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)))
            }
            _ => {
                return Err(CortexError::InvalidInput(format!(
                    "unknown method '{}'",
                    method
                )))
            }
        };
        Ok(value)
    }
}

/// Missing params are treated as `{}`
fn parse<T: DeserializeOwned>(method: &str, params: Value) -> Result<T> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| CortexError::InvalidInput(format!("invalid params for {}: {}", method, e)))
}

/// Run the tool server on stdio
pub fn run_server(cortex: Arc<Cortex>) -> Result<()> {
    ToolServer::new(cortex).run()
}
