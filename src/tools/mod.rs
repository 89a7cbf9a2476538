//! Tool-call query surface
//!
//! `cortex serve` exposes the Cortex queries as line-delimited JSON tool
//! calls over stdio:
//!
//! ```bash
//! echo '{"id":1,"method":"health","params":{"top_n":5}}' | cortex serve
//! ```
//!
//! `ToolClient` is the other end: it drives a tool process over its stdio
//! with a per-call timeout.

pub mod client;
pub mod params;
pub mod protocol;
pub mod server;

pub use client::ToolClient;
pub use protocol::{ToolRequest, ToolResponse};
pub use server::{run_server, ToolServer, METHODS};
