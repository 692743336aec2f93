//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use mcp_chat_client::audit::AuditLog;
use mcp_chat_client::error::{ModelError, ToolError};
use mcp_chat_client::llm::{Message, ModelProvider, ModelResponse};
use mcp_chat_client::mcp::{ToolDescriptor, ToolInvoker, ToolOutput, ToolServer};
use mcp_chat_client::session::Console;
use serde_json::{Map, Value, json};
use tracing::Level;

/// Provider that replays canned responses and records every history it saw.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    pub seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ModelResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ModelError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_completion(
        &self,
        history: &[Message],
        _tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ModelError> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::default()))
    }
}

/// Invoker that answers from a closure and records calls in order.
pub struct StubInvoker {
    handler: Box<dyn Fn(&str, &Value) -> Result<ToolOutput, ToolError> + Send + Sync>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl StubInvoker {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with `"{name} ok"`.
    pub fn echo() -> Self {
        Self::new(|name, _| Ok(ToolOutput::text(format!("{name} ok"))))
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }
}

#[async_trait]
impl ToolInvoker for StubInvoker {
    async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        (self.handler)(name, arguments)
    }
}

/// Tool server double for registry and invoker tests.
pub struct StubServer {
    pub tools: Vec<ToolDescriptor>,
    pub calls: Mutex<Vec<(String, Option<Map<String, Value>>)>>,
    pub fail_listing: bool,
}

impl StubServer {
    pub fn with_tools(names: &[&str]) -> Self {
        Self {
            tools: names.iter().map(|n| tool(n)).collect(),
            calls: Mutex::new(Vec::new()),
            fail_listing: false,
        }
    }
}

#[async_trait]
impl ToolServer for StubServer {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        if self.fail_listing {
            anyhow::bail!("connection closed");
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<ToolOutput, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        let a = arguments
            .as_ref()
            .and_then(|m| m.get("a"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let b = arguments
            .as_ref()
            .and_then(|m| m.get("b"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(ToolOutput::text((a + b).to_string()))
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Audit log that keeps every entry in memory.
#[derive(Default)]
pub struct RecordingAudit {
    pub entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingAudit {
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(_, m)| m.contains(needle))
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

impl AuditLog for RecordingAudit {
    fn record(&self, level: Level, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}

/// Console that feeds scripted lines and captures output.
pub struct ScriptedConsole {
    input: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub printed: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            input: Mutex::new(lines.iter().map(ToString::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
            printed: Mutex::new(Vec::new()),
        }
    }

    pub fn output(&self) -> String {
        self.printed.lock().unwrap().join("\n")
    }

    pub fn prompt_count(&self, prompt: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == prompt)
            .count()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.input.lock().unwrap().pop_front())
    }

    fn print(&self, text: &str) {
        self.printed.lock().unwrap().push(text.to_string());
    }
}

pub fn tool(name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        name,
        format!("{name} tool"),
        json!({
            "type": "object",
            "properties": { "a": { "type": "number" }, "b": { "type": "number" } },
            "required": ["a", "b"]
        }),
    )
}
