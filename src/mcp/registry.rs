use std::collections::HashMap;

use crate::error::DiscoveryError;
use crate::mcp::connection::ToolServer;
use crate::mcp::types::ToolDescriptor;

/// The tools discovered on the connected server. Read-only after discovery.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    // tool name -> position in `tools`
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// List the server's tools once and index them by name.
    pub async fn discover(server: &dyn ToolServer) -> Result<Self, DiscoveryError> {
        let tools = server
            .list_tools()
            .await
            .map_err(DiscoveryError::Transport)?;
        let registry = Self::from_descriptors(tools)?;

        for tool in registry.tools() {
            tracing::info!(
                name: "mcp.tool.discovered",
                tool = %tool.name,
                required = ?tool.required_arguments(),
                "MCP tool discovered"
            );
            tracing::debug!(tool = %tool.name, schema = %tool.input_schema, "Tool input schema");
        }

        Ok(registry)
    }

    /// Build a registry from known descriptors, rejecting empty or repeated names.
    pub fn from_descriptors(tools: Vec<ToolDescriptor>) -> Result<Self, DiscoveryError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (pos, tool) in tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                return Err(DiscoveryError::EmptyName);
            }
            if index.insert(tool.name.clone(), pos).is_some() {
                return Err(DiscoveryError::DuplicateTool(tool.name.clone()));
            }
        }
        Ok(Self { tools, index })
    }

    /// Creates an empty registry for testing.
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&pos| &self.tools[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in discovery order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
