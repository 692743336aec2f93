use crate::llm::LlmSettings;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Prefix for `SECTION__KEY` style environment overrides.
pub const ENV_PREFIX: &str = "MCP_CLIENT";

const DEFAULT_LOG_FILE: &str = "app.log";
const DEFAULT_CONSOLE_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the MCP server script (.py or .js)
    pub server_script: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Audit log file
    #[arg(long, env = "MCP_CLIENT_LOG_FILE")]
    pub log_file: Option<String>,

    /// Call the model without asking for confirmation first
    #[arg(long)]
    pub no_confirm: bool,
}

impl Cli {
    /// Usage line printed when no server script is given.
    pub fn usage() -> String {
        format!("Usage: {} <path_to_server_script>", env!("CARGO_PKG_NAME"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("{0} is not set")]
    MissingCredential(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
    pub conversation: ConversationConfig,
    pub audit: AuditConfig,
}

#[derive(Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationConfig {
    pub confirm_model_calls: bool,
    #[serde(default)]
    pub max_model_rounds: Option<usize>,
    #[serde(default)]
    pub model_timeout_secs: Option<u64>,
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
}

impl ConversationConfig {
    pub fn model_timeout(&self) -> Option<Duration> {
        self.model_timeout_secs.map(Duration::from_secs)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    pub log_file: String,
    pub console_filter: String,
}

impl AuditConfig {
    /// Audit settings from the command line alone, for reporting failures
    /// that happen before the full configuration is assembled.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            log_file: cli
                .log_file
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            console_filter: DEFAULT_CONSOLE_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Assemble configuration. Priority: CLI flag > well-known env var >
    /// `MCP_CLIENT__*` env var > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("anthropic.model", "claude-3-5-sonnet-20241022")?
            .set_default("anthropic.base_url", "https://api.anthropic.com")?
            .set_default("anthropic.max_tokens", 1000)?
            .set_default("openai.model", "gpt-4o-mini")?
            .set_default("openai.base_url", "https://api.openai.com")?
            .set_default("openai.max_tokens", 1000)?
            .set_default("conversation.confirm_model_calls", true)?
            .set_default("audit.log_file", DEFAULT_LOG_FILE)?
            .set_default("audit.console_filter", DEFAULT_CONSOLE_FILTER)?;

        // 2. Config file: explicit path must exist, ./mcp-client.* is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("mcp-client").required(false)),
        };

        // 3. Environment variables, e.g. MCP_CLIENT__CONVERSATION__MAX_MODEL_ROUNDS=5
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Well-known provider variables
        for (var, key) in [
            ("ANTHROPIC_API_KEY", "anthropic.api_key"),
            ("ANTHROPIC_MODEL", "anthropic.model"),
            ("OPENAI_API_KEY", "openai.api_key"),
            ("OPENAI_MODEL", "openai.model"),
        ] {
            if let Ok(val) = env::var(var) {
                if !val.trim().is_empty() {
                    builder = builder.set_override(key, val)?;
                }
            }
        }

        // 5. CLI overrides
        if let Some(log_file) = &cli.log_file {
            builder = builder.set_override("audit.log_file", log_file.as_str())?;
        }
        if cli.no_confirm {
            builder = builder.set_override("conversation.confirm_model_calls", false)?;
        }

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Check that every provider has a credential.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !has_key(&self.anthropic) {
            return Err(ConfigError::MissingCredential("ANTHROPIC_API_KEY"));
        }
        if !has_key(&self.openai) {
            return Err(ConfigError::MissingCredential("OPENAI_API_KEY"));
        }
        Ok(())
    }

    pub fn claude_settings(&self) -> Result<LlmSettings, ConfigError> {
        settings(&self.anthropic, "ANTHROPIC_API_KEY")
    }

    pub fn openai_settings(&self) -> Result<LlmSettings, ConfigError> {
        settings(&self.openai, "OPENAI_API_KEY")
    }
}

fn has_key(provider: &ProviderConfig) -> bool {
    provider
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty())
}

fn settings(provider: &ProviderConfig, var: &'static str) -> Result<LlmSettings, ConfigError> {
    let api_key = provider
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(var))?;
    Ok(LlmSettings {
        base_url: provider.base_url.clone(),
        api_key,
        model: provider.model.clone(),
        max_tokens: provider.max_tokens,
    })
}
