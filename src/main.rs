//! MCP chat client
//!
//! Entry point: connect to the tool server named on the command line, then
//! run the interactive session.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use mcp_chat_client::audit::{AuditLog, TracingAudit};
use mcp_chat_client::config::{AppConfig, AuditConfig, Cli};
use mcp_chat_client::conversation::{AlwaysProceed, ConfirmationGate, LoopSettings};
use mcp_chat_client::llm::ProviderSet;
use mcp_chat_client::mcp::{
    LaunchTarget, McpConnection, RegistryInvoker, ToolRegistry, ToolServer,
};
use mcp_chat_client::session::{Console, ConsoleGate, Session, StdConsole};
use mcp_chat_client::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let Some(script) = cli.server_script.clone() else {
        println!("{}", Cli::usage());
        return Ok(());
    };

    let audit: Arc<dyn AuditLog> = Arc::new(TracingAudit);
    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => {
            telemetry::init(Path::new(&config.audit.log_file), &config.audit.console_filter);
            config
        }
        Err(e) => {
            let fallback = AuditConfig::from_cli(&cli);
            telemetry::init(Path::new(&fallback.log_file), &fallback.console_filter);
            audit.error(&format!("Configuration error: {e}"));
            return Err(e).context("Configuration error");
        }
    };
    if let Err(e) = config.validate() {
        audit.error(&e.to_string());
        return Err(e).context("Configuration error");
    }
    let providers = ProviderSet::from_config(&config)?;

    info!(
        name: "llm.config.loaded",
        claude_model = %config.anthropic.model,
        openai_model = %config.openai.model,
        "LLM configuration loaded"
    );

    // MCP: connect once at startup
    let target = LaunchTarget::from_script(&script).inspect_err(|e| {
        audit.error(&format!("Failed to connect to MCP server: {e}"));
    })?;
    let connection = Arc::new(McpConnection::connect(target).await.inspect_err(|e| {
        audit.error(&format!("Failed to connect to MCP server: {e:#}"));
        eprintln!("Failed to connect to MCP server: {e:#}");
    })?);

    let result = run(&config, providers, Arc::clone(&connection), Arc::clone(&audit)).await;
    if let Err(e) = &result {
        audit.error(&format!("Fatal error in main: {e:#}"));
    }

    audit.info("Cleaning up MCP client resources.");
    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "Failed to close MCP connection");
    }
    result
}

async fn run(
    config: &AppConfig,
    providers: ProviderSet,
    connection: Arc<McpConnection>,
    audit: Arc<dyn AuditLog>,
) -> anyhow::Result<()> {
    let registry = Arc::new(
        ToolRegistry::discover(connection.as_ref())
            .await
            .context("Failed to connect to MCP server")?,
    );
    let names = registry.names().join(", ");
    audit.info(&format!("Connected to server. Tools: {names}"));

    let console: Arc<dyn Console> = Arc::new(StdConsole::new());
    console.print(&format!("Connected to server with tools: [{names}]"));

    let gate: Arc<dyn ConfirmationGate> = if config.conversation.confirm_model_calls {
        Arc::new(ConsoleGate::new(Arc::clone(&console)))
    } else {
        Arc::new(AlwaysProceed)
    };
    let invoker = Arc::new(RegistryInvoker::new(
        Arc::clone(&registry),
        connection as Arc<dyn ToolServer>,
    ));
    let settings = LoopSettings {
        max_model_rounds: config.conversation.max_model_rounds,
        model_timeout: config.conversation.model_timeout(),
        tool_timeout: config.conversation.tool_timeout(),
    };

    let session = Session::new(providers, registry, invoker, gate, audit, settings);
    session.run(console.as_ref()).await?;
    Ok(())
}
