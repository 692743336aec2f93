//! Provider selection.
//!
//! This module holds the closed set of providers a session can pick from and
//! the table mapping each choice to a live backend.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AppConfig, ConfigError};

use super::{ChatCompletionsDriver, ClaudeDriver, ModelProvider};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Claude,
    /// `OpenAI` Chat Completions API.
    OpenAi,
}

impl ProviderKind {
    /// Every selectable provider, in prompt order.
    pub const ALL: [Self; 2] = [Self::OpenAi, Self::Claude];

    /// Parse a user's answer to the provider prompt.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mcp_chat_client::llm::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse(" Claude "), Some(ProviderKind::Claude));
    /// assert_eq!(ProviderKind::parse("gemini"), None);
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "claude" => Some(Self::Claude),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Name shown in prompts and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backends available to a session, keyed by [`ProviderKind`].
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<ProviderKind, Arc<dyn ModelProvider>>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("registered", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Claude and `OpenAI` backends from configuration.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new()
            .with(
                ProviderKind::Claude,
                Arc::new(ClaudeDriver::new(cfg.claude_settings()?)),
            )
            .with(
                ProviderKind::OpenAi,
                Arc::new(ChatCompletionsDriver::new(cfg.openai_settings()?)),
            ))
    }

    /// Register a backend for `kind`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, kind: ProviderKind, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    /// Backend for `kind`, if one is registered.
    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(&kind).map(Arc::clone)
    }
}
