use serde::{Deserialize, Serialize};

/// A tool advertised by the connected server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Names of the top-level arguments the schema marks as required.
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(serde_json::Value::as_array)
            .map(|r| r.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl From<rmcp::model::Tool> for ToolDescriptor {
    fn from(t: rmcp::model::Tool) -> Self {
        Self {
            name: t.name.to_string(),
            description: t.description.as_deref().unwrap_or("").to_string(),
            input_schema: serde_json::Value::Object((*t.input_schema).clone()),
        }
    }
}

/// Successful result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The MCP `content` array.
    pub content: serde_json::Value,
}

impl ToolOutput {
    /// Output consisting of a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: serde_json::json!([{ "type": "text", "text": text.into() }]),
        }
    }
}
