//! Interactive session driver.
//!
//! A session asks once which provider to use, then reads queries until the
//! user types `quit` or input ends. Each query runs one
//! [`ConversationLoop`] against the chosen provider and prints its outcome.
//!
//! # Architecture
//!
//! - [`Console`]: line-based prompt/response, [`StdConsole`] in production
//! - [`ConsoleGate`]: console-backed confirmation before each model call
//! - [`Session`]: the read-eval loop itself

mod console;

pub use console::{Console, ConsoleGate, StdConsole};

use std::sync::Arc;

use thiserror::Error;

use crate::audit::AuditLog;
use crate::conversation::{ConfirmationGate, ConversationLoop, LoopSettings};
use crate::error::ModelError;
use crate::llm::{Message, ProviderKind, ProviderSet};
use crate::mcp::{ToolInvoker, ToolRegistry};

/// Input that ends a session, compared case-insensitively.
pub const QUIT: &str = "quit";

const PROVIDER_PROMPT: &str = "Which LLM? (openai/claude): ";
const QUERY_PROMPT: &str = "Query: ";

/// Why a query produced no outcome.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("provider '{0}' is not implemented")]
    UnsupportedProvider(ProviderKind),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Everything a session needs to run queries.
pub struct Session {
    providers: ProviderSet,
    registry: Arc<ToolRegistry>,
    invoker: Arc<dyn ToolInvoker>,
    gate: Arc<dyn ConfirmationGate>,
    audit: Arc<dyn AuditLog>,
    settings: LoopSettings,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("providers", &self.providers)
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn is_quit(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(QUIT)
}

impl Session {
    pub fn new(
        providers: ProviderSet,
        registry: Arc<ToolRegistry>,
        invoker: Arc<dyn ToolInvoker>,
        gate: Arc<dyn ConfirmationGate>,
        audit: Arc<dyn AuditLog>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            providers,
            registry,
            invoker,
            gate,
            audit,
            settings,
        }
    }

    /// Run the interactive loop until `quit` or end of input.
    ///
    /// Only console I/O failures are returned; query failures are reported
    /// and the prompt resumes.
    pub async fn run(&self, console: &dyn Console) -> std::io::Result<()> {
        self.audit.info("MCP Client Started!");
        console.print("\nMCP Client Started!");

        let Some(kind) = self.select_provider(console).await? else {
            self.audit.info("User exited before choosing a provider.");
            return Ok(());
        };
        self.audit.info(&format!("Provider selected: {kind}"));

        console.print("Type your queries or 'quit' to exit.");
        loop {
            let Some(query) = console.read_line(QUERY_PROMPT).await? else {
                self.audit.info("Input closed, ending chat loop.");
                break;
            };
            self.audit.info(&format!("User input: {query}"));

            if is_quit(&query) {
                self.audit.info("User exited chat loop.");
                break;
            }
            if query.trim().is_empty() {
                continue;
            }

            match self.process_query(kind, &query).await {
                Ok(response) => {
                    self.audit.info(&format!("Response: {response}"));
                    console.print(&format!("\n{response}"));
                }
                Err(e) => {
                    self.audit.error(&format!("Error processing query: {e}"));
                    console.print(&format!("Error processing query: {e}"));
                }
            }
        }
        Ok(())
    }

    /// Ask until the answer names a known provider. `None` on quit or end of input.
    async fn select_provider(&self, console: &dyn Console) -> std::io::Result<Option<ProviderKind>> {
        loop {
            let Some(answer) = console.read_line(PROVIDER_PROMPT).await? else {
                return Ok(None);
            };
            if is_quit(&answer) {
                return Ok(None);
            }
            match ProviderKind::parse(&answer) {
                Some(kind) => return Ok(Some(kind)),
                None => console.print("Please enter 'openai' or 'claude'."),
            }
        }
    }

    /// Run one query against `kind` and return the outcome text.
    pub async fn process_query(&self, kind: ProviderKind, query: &str) -> Result<String, QueryError> {
        self.audit
            .info(&format!("Received user query: {query} (LLM: {kind})"));

        let provider = self
            .providers
            .get(kind)
            .ok_or(QueryError::UnsupportedProvider(kind))?;

        let conversation = ConversationLoop::new(
            provider,
            Arc::clone(&self.invoker),
            Arc::clone(&self.gate),
            Arc::clone(&self.audit),
            self.settings,
        );
        let outcome = conversation
            .run(vec![Message::user(query)], self.registry.tools())
            .await?;
        Ok(outcome.text)
    }
}
