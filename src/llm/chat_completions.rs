//! OpenAI Chat Completions API driver.
//!
//! This module implements [`ModelProvider`] for the OpenAI Chat Completions
//! API (`/v1/chat/completions`), including function-style tool calls.

use serde_json::{Value, json};

use crate::error::ModelError;
use crate::mcp::ToolDescriptor;

use super::{
    ContentUnit, LlmSettings, Message, MessageRole, ModelProvider, ModelResponse,
    ToolInvocationRequest,
};

const PROVIDER: &str = "openai";

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: super::http_client(),
            settings,
        }
    }

    pub(crate) fn build_request_body(&self, history: &[Message], tools: &[ToolDescriptor]) -> Value {
        let messages: Vec<Value> = history
            .iter()
            .map(|msg| match msg.role {
                MessageRole::User => json!({ "role": "user", "content": msg.content.to_text() }),
                MessageRole::Assistant => {
                    json!({ "role": "assistant", "content": msg.content.to_text() })
                }
                // A `tool` role message must answer an assistant `tool_calls`
                // turn, which the history does not keep.
                MessageRole::ToolResult => json!({
                    "role": "user",
                    "content": format!(
                        "Result of tool {}: {}",
                        msg.tool_name.as_deref().unwrap_or("unknown"),
                        msg.content.to_text()
                    )
                }),
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
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.input_schema
                            }
                        })
                    })
                    .collect(),
            );
            body["tool_choice"] = json!("auto");
        }

        body
    }
}

/// Decode a Chat Completions reply into content units.
///
/// Text comes first, followed by tool calls in the order listed. Arguments
/// that are not valid JSON are kept as a raw string so the invoker can
/// report them as malformed.
pub(crate) fn parse_response(body: &Value) -> Result<ModelResponse, ModelError> {
    let choice = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .ok_or_else(|| ModelError::Malformed {
            provider: PROVIDER.to_string(),
            reason: "missing choices".to_string(),
        })?;
    let message = &choice["message"];

    let mut units = Vec::new();
    if let Some(text) = message.get("content").and_then(Value::as_str) {
        if !text.is_empty() {
            units.push(ContentUnit::text(text));
        }
    }

    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            let function = &call["function"];
            let Some(name) = function.get("name").and_then(Value::as_str) else {
                return Err(ModelError::Malformed {
                    provider: PROVIDER.to_string(),
                    reason: "tool call without function name".to_string(),
                });
            };
            let raw_args = function
                .get("arguments")
                .and_then(Value::as_str)
                .unwrap_or("");
            let arguments = if raw_args.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(raw_args).unwrap_or_else(|_| Value::String(raw_args.to_string()))
            };
            units.push(ContentUnit::ToolInvocation(ToolInvocationRequest {
                id: call.get("id").and_then(Value::as_str).map(ToString::to_string),
                name: name.to_string(),
                arguments,
            }));
        }
    }

    Ok(ModelResponse {
        units,
        stop_reason: choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

#[async_trait::async_trait]
impl ModelProvider for ChatCompletionsDriver {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn create_completion(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ModelError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let body = self.build_request_body(history, tools);

        tracing::info!(
            model = %self.settings.model,
            url = %url,
            message_count = history.len(),
            tool_count = tools.len(),
            "Calling OpenAI API"
        );

        let transport = |source: reqwest::Error| ModelError::Transport {
            provider: PROVIDER.to_string(),
            source,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
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
