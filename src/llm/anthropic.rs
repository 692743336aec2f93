//! Anthropic Messages API driver.
//!
//! This module implements [`ModelProvider`] for the Anthropic Messages API
//! (`/v1/messages`), including tool use.

use serde_json::{Value, json};

use crate::error::ModelError;
use crate::mcp::ToolDescriptor;

use super::{
    ContentUnit, LlmSettings, Message, MessageRole, ModelProvider, ModelResponse,
    ToolInvocationRequest,
};

const PROVIDER: &str = "claude";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Driver for the Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ClaudeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ClaudeDriver {
    /// Create a new Claude driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: super::http_client(),
            settings,
        }
    }

    /// Convert the conversation into an Anthropic request body.
    ///
    /// Tool results go back as `user` turns carrying the tool output, since
    /// the history keeps no assistant `tool_use` turn to pair them with.
    pub(crate) fn build_request_body(&self, history: &[Message], tools: &[ToolDescriptor]) -> Value {
        let messages: Vec<Value> = history
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    MessageRole::Assistant => "assistant",
                    MessageRole::User | MessageRole::ToolResult => "user",
                };
                json!({ "role": role, "content": msg.content.to_text() })
            })
            .collect();

        let mut body = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "messages": messages,
        });

        if !tools.is_empty() {
            body["tools"] = Value::Array(
                tools
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.input_schema
                        })
                    })
                    .collect(),
            );
        }

        body
    }
}

/// Decode a Messages API reply into content units.
pub(crate) fn parse_response(body: &Value) -> Result<ModelResponse, ModelError> {
    let malformed = |reason: &str| ModelError::Malformed {
        provider: PROVIDER.to_string(),
        reason: reason.to_string(),
    };

    let content = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing content array"))?;

    let mut units = Vec::with_capacity(content.len());
    for block in content {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                let text = block
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("text block without text"))?;
                units.push(ContentUnit::text(text));
            }
            Some("tool_use") => {
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("tool_use block without name"))?;
                units.push(ContentUnit::ToolInvocation(ToolInvocationRequest {
                    id: block.get("id").and_then(Value::as_str).map(ToString::to_string),
                    name: name.to_string(),
                    arguments: block.get("input").cloned().unwrap_or(Value::Null),
                }));
            }
            other => {
                tracing::debug!(block_type = ?other, "Skipping unhandled Claude content block");
            }
        }
    }

    Ok(ModelResponse {
        units,
        stop_reason: body
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

#[async_trait::async_trait]
impl ModelProvider for ClaudeDriver {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn create_completion(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ModelError> {
        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        let body = self.build_request_body(history, tools);

        tracing::info!(
            model = %self.settings.model,
            url = %url,
            message_count = history.len(),
            tool_count = tools.len(),
            "Calling Claude API"
        );

        let transport = |source: reqwest::Error| ModelError::Transport {
            provider: PROVIDER.to_string(),
            source,
        };

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let reply: Value = resp.json().await.map_err(transport)?;
        parse_response(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> ClaudeDriver {
        ClaudeDriver::new(LlmSettings {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: "test".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 1000,
        })
    }

    #[test]
    fn test_parse_text_and_tool_use_in_order() {
        let body = json!({
            "content": [
                { "type": "text", "text": "Checking." },
                { "type": "tool_use", "id": "toolu_1", "name": "get_forecast",
                  "input": { "latitude": 38.5, "longitude": -121.4 } }
            ],
            "stop_reason": "tool_use"
        });

        let response = parse_response(&body).unwrap();
        assert_eq!(response.units.len(), 2);
        assert_eq!(response.units[0], ContentUnit::text("Checking."));
        match &response.units[1] {
            ContentUnit::ToolInvocation(call) => {
                assert_eq!(call.id.as_deref(), Some("toolu_1"));
                assert_eq!(call.name, "get_forecast");
                assert_eq!(call.arguments["latitude"], 38.5);
            }
            other => panic!("expected tool invocation, got {other:?}"),
        }
        assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
    }

    #[test]
    fn test_parse_empty_content() {
        let response = parse_response(&json!({ "content": [] })).unwrap();
        assert!(response.units.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_content() {
        let err = parse_response(&json!({ "type": "error" })).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }

    #[test]
    fn test_request_body_maps_tool_results_to_user_turns() {
        let history = vec![
            Message::user("weather in Sacramento?"),
            Message::tool_result(
                "get_forecast",
                Some("toolu_1".to_string()),
                json!([{ "type": "text", "text": "Sunny" }]),
            ),
        ];
        let tools = vec![ToolDescriptor::new(
            "get_forecast",
            "Get weather forecast for a location.",
            json!({ "type": "object", "properties": {} }),
        )];

        let body = driver().build_request_body(&history, &tools);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Sunny");
        assert_eq!(body["tools"][0]["name"], "get_forecast");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn test_request_body_omits_empty_tools() {
        let body = driver().build_request_body(&[Message::user("hi")], &[]);
        assert!(body.get("tools").is_none());
    }
}
