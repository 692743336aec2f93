use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use rmcp::{
    model::CallToolRequestParam,
    service::{Peer, RoleClient, RunningService, ServiceExt},
    transport::TokioChildProcess,
};
use serde_json::{Map, Value};
use tokio::{process::Command, sync::Mutex};

use crate::error::ToolError;
use crate::mcp::types::{ToolDescriptor, ToolOutput};

/// Request/response access to a tool server.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Fetch every tool the server advertises.
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>>;

    /// Forward one call. Never retried.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<ToolOutput, ToolError>;

    /// Shut the server down. Later calls fail with a transport error.
    async fn close(&self) -> anyhow::Result<()>;
}

/// How to launch a server script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub command: String,
    pub script: PathBuf,
}

impl LaunchTarget {
    /// Pick the interpreter from the script extension: `.py` or `.js`.
    pub fn from_script(script: impl AsRef<Path>) -> anyhow::Result<Self> {
        let script = script.as_ref();
        let command = match script.extension().and_then(|e| e.to_str()) {
            Some("py") => {
                if cfg!(windows) {
                    "python"
                } else {
                    "python3"
                }
            }
            Some("js") => "node",
            _ => {
                return Err(anyhow!(
                    "server script must be a .js or .py file: {}",
                    script.display()
                ));
            }
        };
        Ok(Self {
            command: command.to_string(),
            script: script.to_path_buf(),
        })
    }
}

/// A live MCP session with a child-process server.
pub struct McpConnection {
    target: LaunchTarget,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl std::fmt::Debug for McpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpConnection")
            .field("target", &self.target)
            .finish()
    }
}

impl McpConnection {
    /// Spawn the server and complete the MCP handshake.
    pub async fn connect(target: LaunchTarget) -> anyhow::Result<Self> {
        let mut cmd = Command::new(&target.command);
        cmd.arg(&target.script);

        tracing::info!(
            command = %target.command,
            script = %target.script.display(),
            "Attempting to connect to MCP server"
        );

        let transport = TokioChildProcess::new(cmd)
            .with_context(|| format!("failed to spawn '{}'", target.command))?;
        let service = ()
            .serve(transport)
            .await
            .with_context(|| format!("failed to connect to MCP server '{}'", target.script.display()))?;
        let peer = service.peer().clone();

        Ok(Self {
            target,
            peer,
            service: Mutex::new(Some(service)),
        })
    }
}

#[async_trait]
impl ToolServer for McpConnection {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .context("tools/list request failed")?;
        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<ToolOutput, ToolError> {
        let result = self
            .peer
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments,
            })
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let value = serde_json::to_value(&result)
            .map_err(|e| ToolError::Transport(format!("unreadable tools/call result: {e}")))?;
        tool_output_from_result(name, value)
    }

    async fn close(&self) -> anyhow::Result<()> {
        if let Some(service) = self.service.lock().await.take() {
            let reason = service.cancel().await.context("MCP service task failed")?;
            tracing::info!(reason = ?reason, "MCP connection closed");
        }
        Ok(())
    }
}

/// Interpret a serialized `CallToolResult`.
///
/// `isError: true` means the server rejected the call; the text of its
/// content becomes the failure message.
pub(crate) fn tool_output_from_result(name: &str, value: Value) -> Result<ToolOutput, ToolError> {
    let is_error = value
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let content = value
        .get("content")
        .cloned()
        .ok_or_else(|| ToolError::Transport("tools/call result without content".to_string()))?;

    if is_error {
        let message = crate::llm::MessageContent::Structured(content).to_text();
        return Err(ToolError::Rejected {
            tool: name.to_string(),
            message,
        });
    }

    Ok(ToolOutput { content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launch_target_python() {
        let target = LaunchTarget::from_script("weather/weather.py").unwrap();
        assert!(target.command.starts_with("python"));
        assert_eq!(target.script, PathBuf::from("weather/weather.py"));
    }

    #[test]
    fn test_launch_target_node() {
        let target = LaunchTarget::from_script("build/index.js").unwrap();
        assert_eq!(target.command, "node");
    }

    #[test]
    fn test_launch_target_rejects_other_extensions() {
        let err = LaunchTarget::from_script("server.sh").unwrap_err();
        assert!(err.to_string().contains(".js or .py"));
        assert!(LaunchTarget::from_script("server").is_err());
    }

    #[test]
    fn test_result_success() {
        let output = tool_output_from_result(
            "add",
            json!({ "content": [{ "type": "text", "text": "4" }], "isError": false }),
        )
        .unwrap();
        assert_eq!(output, ToolOutput::text("4"));
    }

    #[test]
    fn test_result_is_error_becomes_rejection() {
        let err = tool_output_from_result(
            "get_alerts",
            json!({ "content": [{ "type": "text", "text": "bad state code" }], "isError": true }),
        )
        .unwrap_err();
        match err {
            ToolError::Rejected { tool, message } => {
                assert_eq!(tool, "get_alerts");
                assert_eq!(message, "bad state code");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_result_without_content_is_transport_error() {
        assert!(matches!(
            tool_output_from_result("add", json!({})),
            Err(ToolError::Transport(_))
        ));
    }
}
