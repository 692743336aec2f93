//! The tool-use conversation loop.
//!
//! One [`ConversationLoop::run`] drives a single user query to completion:
//!
//! 1. Ask the [`ConfirmationGate`] whether to call the model
//! 2. Send the full history and the tool set to the provider
//! 3. Accumulate text units; invoke tool units in emission order
//! 4. Feed successful tool results back into the history
//! 5. Repeat while the model keeps asking for tools
//!
//! Only model transport failures escape `run`. Tool failures become inline
//! trace lines in the outcome text.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_chat_client::conversation::{ConversationLoop, LoopSettings};
//! use mcp_chat_client::llm::Message;
//!
//! let conversation = ConversationLoop::new(provider, invoker, gate, audit, LoopSettings::default());
//! let outcome = conversation.run(vec![Message::user("what is 2+2")], registry.tools()).await?;
//! println!("{}", outcome.text);
//! ```

mod gate;

pub use gate::{AlwaysProceed, ConfirmationGate};

use std::sync::Arc;
use std::time::Duration;

use tracing::Level;
use uuid::Uuid;

use crate::audit::AuditLog;
use crate::error::{ModelError, ToolError};
use crate::llm::{ContentUnit, Message, ModelProvider, ModelResponse, ToolInvocationRequest};
use crate::mcp::{ToolDescriptor, ToolInvoker, ToolOutput};

/// Limits applied to one run. The defaults impose none.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopSettings {
    /// Stop after this many model calls.
    pub max_model_rounds: Option<usize>,
    /// Give up on a model call after this long.
    pub model_timeout: Option<Duration>,
    /// Give up on a tool call after this long.
    pub tool_timeout: Option<Duration>,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// The model answered without requesting tools.
    Completed,
    /// The confirmation gate declined a model call.
    Aborted,
    /// `max_model_rounds` was reached.
    RoundLimit,
}

/// Result of one query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Text units and tool traces joined by newlines.
    pub text: String,
    /// History as it stood when the run ended.
    pub history: Vec<Message>,
    /// Number of model calls made.
    pub model_rounds: usize,
    /// Why the run ended.
    pub finish: Finish,
}

enum LoopState {
    AwaitModel,
    InvokeTools(ModelResponse),
    Done(Finish),
}

/// Drives one query through model round-trips and tool calls.
pub struct ConversationLoop {
    provider: Arc<dyn ModelProvider>,
    invoker: Arc<dyn ToolInvoker>,
    gate: Arc<dyn ConfirmationGate>,
    audit: Arc<dyn AuditLog>,
    settings: LoopSettings,
}

impl std::fmt::Debug for ConversationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationLoop")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ConversationLoop {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        invoker: Arc<dyn ToolInvoker>,
        gate: Arc<dyn ConfirmationGate>,
        audit: Arc<dyn AuditLog>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            provider,
            invoker,
            gate,
            audit,
            settings,
        }
    }

    /// Run the loop over `history` (which should end with the user query).
    pub async fn run(
        &self,
        mut history: Vec<Message>,
        tools: &[ToolDescriptor],
    ) -> Result<QueryOutcome, ModelError> {
        let query_id = Uuid::new_v4().to_string();
        let provider = self.provider.name().to_string();
        let mut output: Vec<String> = Vec::new();
        let mut rounds = 0usize;
        let mut state = LoopState::AwaitModel;

        tracing::info!(
            query_id = %query_id,
            provider = %provider,
            message_count = history.len(),
            tool_count = tools.len(),
            "Starting conversation loop"
        );

        let finish = loop {
            state = match state {
                LoopState::AwaitModel => {
                    if self
                        .settings
                        .max_model_rounds
                        .is_some_and(|max| rounds >= max)
                    {
                        self.audit.warn(&format!(
                            "Stopping tool-use loop after {rounds} model rounds"
                        ));
                        output.push(format!("[Stopped after {rounds} model rounds]"));
                        LoopState::Done(Finish::RoundLimit)
                    } else if !self.gate.confirm(&provider).await {
                        self.audit.info(&format!(
                            "User chose not to continue with {provider} API call. Exiting tool-use loop."
                        ));
                        LoopState::Done(Finish::Aborted)
                    } else {
                        rounds += 1;
                        let response = self.call_model(&query_id, rounds, &history, tools).await?;
                        if response.tool_invocation_count() == 0 {
                            for unit in response.units {
                                if let ContentUnit::Text { text } = unit {
                                    output.push(text);
                                }
                            }
                            LoopState::Done(Finish::Completed)
                        } else {
                            LoopState::InvokeTools(response)
                        }
                    }
                }
                LoopState::InvokeTools(response) => {
                    for unit in response.units {
                        match unit {
                            ContentUnit::Text { text } => output.push(text),
                            ContentUnit::ToolInvocation(call) => {
                                self.invoke_tool(&query_id, rounds, call, &mut history, &mut output)
                                    .await;
                            }
                        }
                    }
                    LoopState::AwaitModel
                }
                LoopState::Done(finish) => break finish,
            };
        };

        tracing::info!(
            query_id = %query_id,
            rounds = rounds,
            finish = ?finish,
            "Conversation loop finished"
        );

        Ok(QueryOutcome {
            text: output.join("\n"),
            history,
            model_rounds: rounds,
            finish,
        })
    }

    async fn call_model(
        &self,
        query_id: &str,
        round: usize,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ModelError> {
        let provider = self.provider.name();
        self.audit.record_json(
            Level::DEBUG,
            &format!("Sending {provider} API call"),
            &serde_json::to_value(history).unwrap_or_default(),
        );

        let call = self.provider.create_completion(history, tools);
        let result = match self.settings.model_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .unwrap_or_else(|_| {
                    Err(ModelError::Timeout {
                        provider: provider.to_string(),
                        timeout,
                    })
                }),
            None => call.await,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(query_id = %query_id, round = round, error = %e, "Model call failed");
                self.audit.error(&format!("{provider} API call failed: {e}"));
                return Err(e);
            }
        };

        self.audit.record_json(
            Level::DEBUG,
            &format!("{provider} response"),
            &serde_json::to_value(&response).unwrap_or_default(),
        );
        self.audit.debug(&format!(
            "num of response content: {}, tools to use: {}",
            response.units.len(),
            response.tool_invocation_count()
        ));
        tracing::debug!(
            query_id = %query_id,
            round = round,
            unit_count = response.units.len(),
            tool_call_count = response.tool_invocation_count(),
            "Model response received"
        );

        Ok(response)
    }

    async fn invoke_tool(
        &self,
        query_id: &str,
        round: usize,
        call: ToolInvocationRequest,
        history: &mut Vec<Message>,
        output: &mut Vec<String>,
    ) {
        let args = serde_json::to_string(&call.arguments).unwrap_or_default();
        self.audit
            .info(&format!("Calling tool: {} with args: {args}", call.name));
        self.audit.info(&format!("Tool used: {}", call.name));

        match self.call_tool(&call).await {
            Ok(result) => {
                tracing::info!(
                    query_id = %query_id,
                    round = round,
                    tool = %call.name,
                    "Tool call succeeded"
                );
                self.audit
                    .info(&format!("Tool {} called and returned result", call.name));
                output.push(format!("[Calling tool {} with args {args}]", call.name));
                history.push(Message::tool_result(call.name, call.id, result.content));
            }
            Err(e) => {
                tracing::error!(
                    query_id = %query_id,
                    round = round,
                    tool = %call.name,
                    error = %e,
                    "Tool call failed"
                );
                self.audit
                    .error(&format!("Error during tool call {}: {e}", call.name));
                // No history entry: the model never sees the failure.
                output.push(format!("[Error calling tool {}: {e}]", call.name));
            }
        }
    }

    async fn call_tool(&self, call: &ToolInvocationRequest) -> Result<ToolOutput, ToolError> {
        let invocation = self.invoker.invoke(&call.name, &call.arguments);
        match self.settings.tool_timeout {
            Some(timeout) => tokio::time::timeout(timeout, invocation)
                .await
                .unwrap_or(Err(ToolError::Timeout(timeout))),
            None => invocation.await,
        }
    }
}
