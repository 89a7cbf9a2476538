//! Tool client over a child process's stdio
//!
//! Requests are written one per line and matched to responses by id. Every
//! call is bounded by the configured timeout; a timed-out call is not retried.

use super::protocol::{ToolRequest, ToolResponse};
use crate::error::{CortexError, Result};
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

pub struct ToolClient {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    timeout: Duration,
}

impl ToolClient {
    pub fn spawn<I, S>(program: &str, args: I, call_timeout: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CortexError::Tool("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CortexError::Tool("child stdout unavailable".to_string()))?;

        debug!("Spawned tool process {}", program);
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            timeout: call_timeout,
        })
    }

    /// Call `method` and wait for the matching response
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = ToolRequest {
            id: json!(id),
            method: method.to_string(),
            params,
        };
        let mut line = serde_json::to_string(&request)?;
        line.push('\n');

        let after = self.timeout;
        let response = timeout(after, async {
            self.stdin.write_all(line.as_bytes()).await?;
            self.stdin.flush().await?;
            self.read_response(id).await
        })
        .await
        .map_err(|_| CortexError::Timeout {
            operation: format!("tool call {}", method),
            after,
        })??;

        match (response.result, response.error) {
            (_, Some(err)) => Err(CortexError::Tool(format!("{}: {}", err.code, err.message))),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    async fn read_response(&mut self, id: u64) -> Result<ToolResponse> {
        let expected = json!(id);
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(CortexError::Tool("tool process closed its output".to_string()));
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ToolResponse>(&line) {
                Ok(resp) if resp.id == expected => return Ok(resp),
                Ok(resp) => debug!("Ignoring response for id {}", resp.id),
                Err(e) => warn!("Ignoring malformed tool output: {}", e),
            }
        }
    }

    /// Close stdin and wait briefly for the child to exit
    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.stdin);
        match timeout(self.timeout, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!("Tool process exited: {}", status);
                Ok(())
            }
            Err(_) => {
                warn!("Tool process did not exit; killing it");
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_matching_response_is_returned() {
        let script = r#"read line; echo '{"id":99,"result":"stale"}'; echo '{"id":1,"result":{"ok":true}}'"#;
        let mut client = ToolClient::spawn("sh", ["-c", script], Duration::from_secs(5)).unwrap();
        let result = client.call("ping", Value::Null).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_response_becomes_tool_error() {
        let script = r#"read line; echo '{"id":1,"error":{"code":"not_found","message":"nope"}}'"#;
        let mut client = ToolClient::spawn("sh", ["-c", script], Duration::from_secs(5)).unwrap();
        let err = client.call("metrics", json!({})).await.unwrap_err();
        assert!(matches!(err, CortexError::Tool(ref m) if m.starts_with("not_found")));
    }

    #[tokio::test]
    async fn test_silent_tool_times_out() {
        let mut client =
            ToolClient::spawn("sh", ["-c", "read line; sleep 10"], Duration::from_millis(200)).unwrap();
        let err = client.call("scan", Value::Null).await.unwrap_err();
        assert!(matches!(err, CortexError::Timeout { .. }));
        assert_eq!(err.code(), "timeout");
    }

    #[tokio::test]
    async fn test_closed_output_is_an_error() {
        let mut client = ToolClient::spawn("sh", ["-c", "read line"], Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.call("scan", Value::Null).await,
            Err(CortexError::Tool(_))
        ));
    }
}
