//! Error types shared across the client.

use std::time::Duration;

use thiserror::Error;

/// Failure talking to a model provider. Propagates out of the conversation loop.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error (HTTP {status}): {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("malformed {provider} response: {reason}")]
    Malformed { provider: String, reason: String },
    #[error("{provider} did not answer within {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Failure invoking a tool. Always recovered inside the conversation loop.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}': not provided by the connected server")]
    UnknownTool(String),
    #[error("malformed arguments for '{tool}': {reason}")]
    MalformedArguments { tool: String, reason: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("tool '{tool}' rejected the call: {message}")]
    Rejected { tool: String, message: String },
    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

/// Failure establishing the tool registry.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("tools/list failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("server returned a tool with an empty name")]
    EmptyName,
    #[error("server returned duplicate tool name '{0}'")]
    DuplicateTool(String),
}
