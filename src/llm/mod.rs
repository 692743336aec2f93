//! LLM provider traits and conversation data model.
//!
//! This module provides the provider-agnostic message model exchanged with
//! Large Language Models, plus the two HTTP backends the client ships with.
//!
//! # Overview
//!
//! The [`ModelProvider`] trait defines the single completion call every
//! backend must support. A response decomposes into ordered
//! [`ContentUnit`]s, either plain text or a request to invoke a tool.
//!
//! # Providers
//!
//! - [`ClaudeDriver`]: Anthropic Messages API (`/v1/messages`)
//! - [`ChatCompletionsDriver`]: `OpenAI` Chat Completions API (`/v1/chat/completions`)
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_chat_client::llm::{ClaudeDriver, Message, ModelProvider};
//!
//! let driver = ClaudeDriver::new(settings);
//! let response = driver
//!     .create_completion(&[Message::user("what is 2+2")], &tools)
//!     .await?;
//! ```

pub mod anthropic;
pub mod chat_completions;
pub mod provider;

pub use anthropic::ClaudeDriver;
pub use chat_completions::ChatCompletionsDriver;
pub use provider::{ProviderKind, ProviderSet};

use crate::error::ModelError;
use crate::mcp::ToolDescriptor;

/// Connection and model settings for one provider.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the API (e.g., `https://api.anthropic.com`).
    pub base_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g., `claude-3-5-sonnet-20241022`).
    pub model: String,
    /// Upper bound on generated tokens per completion.
    pub max_tokens: u32,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageRole {
    /// User message.
    User,
    /// Assistant response.
    Assistant,
    /// Content returned by a tool invocation.
    ToolResult,
}

/// Message content - free text or a structured tool payload.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Structured payload, typically the MCP `content` array of a tool result.
    Structured(serde_json::Value),
}

impl MessageContent {
    /// Render the content as text for providers that only accept strings.
    ///
    /// MCP content arrays contribute the `text` of their text blocks; any
    /// other structure is serialized as compact JSON.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                if let Some(blocks) = value.as_array() {
                    let texts: Vec<&str> = blocks
                        .iter()
                        .filter_map(|b| b.get("text").and_then(serde_json::Value::as_str))
                        .collect();
                    if !texts.is_empty() && texts.len() == blocks.len() {
                        return texts.join("\n");
                    }
                }
                value
                    .as_str()
                    .map_or_else(|| value.to_string(), ToString::to_string)
            }
        }
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Content of the message.
    pub content: MessageContent,
    /// Tool that produced this message (tool results only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Provider-assigned id of the call this message answers (tool results only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
        }
    }


    /// Create a tool-result message carrying the payload a tool returned.
    #[must_use]
    pub fn tool_result(
        tool_name: impl Into<String>,
        tool_call_id: Option<String>,
        content: serde_json::Value,
    ) -> Self {
        Self {
            role: MessageRole::ToolResult,
            content: MessageContent::Structured(content),
            tool_name: Some(tool_name.into()),
            tool_call_id,
        }
    }
}

/// A request, emitted by the model, to call a tool.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolInvocationRequest {
    /// Provider-assigned call id, when the provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the tool to call.
    pub name: String,
    /// Argument payload. `Null` when the model sent none.
    pub arguments: serde_json::Value,
}

impl ToolInvocationRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }
}

/// One unit of model output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentUnit {
    /// Text to show the user.
    Text {
        /// The text content.
        text: String,
    },
    /// A tool-invocation request.
    ToolInvocation(ToolInvocationRequest),
}

impl ContentUnit {
    /// Create a text unit.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    /// Create a tool-invocation unit.
    #[must_use]
    pub fn tool(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::ToolInvocation(ToolInvocationRequest::new(name, arguments))
    }
}

/// Decoded model reply.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelResponse {
    /// Content units in the order the model emitted them.
    pub units: Vec<ContentUnit>,
    /// Provider stop reason, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl ModelResponse {
    #[must_use]
    pub fn new(units: Vec<ContentUnit>) -> Self {
        Self {
            units,
            stop_reason: None,
        }
    }

    /// Number of tool-invocation units in this response.
    #[must_use]
    pub fn tool_invocation_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u, ContentUnit::ToolInvocation(_)))
            .count()
    }
}

/// Trait for LLM backends.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short provider name used in prompts and logs.
    fn name(&self) -> &str;

    /// Send the full history and the available tools, return the decoded reply.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the provider is unreachable, rejects the
    /// request, or replies with something that cannot be decoded.
    async fn create_completion(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ModelError>;
}

/// Build a `reqwest` client shared by the HTTP drivers.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_text_blocks_render_as_text() {
        let content = MessageContent::Structured(json!([
            { "type": "text", "text": "Sunny" },
            { "type": "text", "text": "22C" }
        ]));
        assert_eq!(content.to_text(), "Sunny\n22C");
    }

    #[test]
    fn test_structured_non_text_renders_as_json() {
        let content = MessageContent::Structured(json!({ "temp": 22 }));
        assert_eq!(content.to_text(), r#"{"temp":22}"#);

        let mixed = MessageContent::Structured(json!([
            { "type": "text", "text": "a" },
            { "type": "image", "data": "..." }
        ]));
        assert!(mixed.to_text().starts_with('['));
    }

    #[test]
    fn test_tool_invocation_count() {
        let response = ModelResponse::new(vec![
            ContentUnit::text("let me check"),
            ContentUnit::tool("add", json!({ "a": 1 })),
            ContentUnit::tool("add", json!({ "a": 2 })),
        ]);
        assert_eq!(response.tool_invocation_count(), 2);
        assert_eq!(ModelResponse::default().tool_invocation_count(), 0);
    }

    #[test]
    fn test_message_role_serializes_kebab_case() {
        let msg = Message::tool_result("add", None, json!([]));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool-result");
        assert_eq!(value["tool_name"], "add");
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let settings = LlmSettings {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: "sk-secret".to_string(),
            model: "m".to_string(),
            max_tokens: 10,
        };
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }
}
