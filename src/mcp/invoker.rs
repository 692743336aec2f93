use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::mcp::connection::ToolServer;
use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::ToolOutput;

/// Executes tool calls requested by the model.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Call `name` once with `arguments` (a JSON object, or `Null` for none).
    async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError>;
}

/// Invoker that checks calls against the discovered registry before
/// forwarding them to the server.
#[derive(Clone)]
pub struct RegistryInvoker {
    registry: Arc<ToolRegistry>,
    server: Arc<dyn ToolServer>,
}

impl std::fmt::Debug for RegistryInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryInvoker")
            .field("registry", &self.registry)
            .finish()
    }
}

impl RegistryInvoker {
    pub fn new(registry: Arc<ToolRegistry>, server: Arc<dyn ToolServer>) -> Self {
        Self { registry, server }
    }
}

#[async_trait]
impl ToolInvoker for RegistryInvoker {
    async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        if !self.registry.contains(name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }

        let arguments = match arguments {
            Value::Null => None,
            Value::Object(map) => Some(map.clone()),
            Value::String(raw) => {
                return Err(ToolError::MalformedArguments {
                    tool: name.to_string(),
                    reason: format!("not valid JSON: {raw}"),
                });
            }
            other => {
                return Err(ToolError::MalformedArguments {
                    tool: name.to_string(),
                    reason: format!("expected an object, got {other}"),
                });
            }
        };

        self.server.call_tool(name, arguments).await
    }
}
