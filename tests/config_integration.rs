use clap::Parser;
use mcp_chat_client::config::{AppConfig, AuditConfig, Cli, ConfigError};
use serial_test::serial;
use std::env;
use std::fs;

const VARS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_MODEL",
    "OPENAI_API_KEY",
    "OPENAI_MODEL",
    "CONFIG_FILE",
    "MCP_CLIENT_LOG_FILE",
    "MCP_CLIENT__CONVERSATION__MAX_MODEL_ROUNDS",
    "MCP_CLIENT__OPENAI__BASE_URL",
];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
    }
}

fn load(extra: &[&str]) -> Result<AppConfig, ConfigError> {
    let mut args = vec!["mcp-chat-client", "server.py"];
    args.extend_from_slice(extra);
    AppConfig::load_from_args(args)
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]).unwrap();

    assert_eq!(config.anthropic.model, "claude-3-5-sonnet-20241022");
    assert_eq!(config.anthropic.max_tokens, 1000);
    assert_eq!(config.openai.model, "gpt-4o-mini");
    assert!(config.conversation.confirm_model_calls);
    assert_eq!(config.conversation.max_model_rounds, None);
    assert_eq!(config.conversation.model_timeout(), None);
    assert_eq!(config.audit.log_file, "app.log");
}

#[test]
#[serial]
fn test_missing_credentials_fail_validation() {
    clear_env_vars();
    unsafe {
        env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
    }

    let config = load(&[]).unwrap();
    let err = config.validate().unwrap_err();

    assert!(matches!(err, ConfigError::MissingCredential("OPENAI_API_KEY")));
    assert!(config.openai_settings().is_err());
    assert!(config.claude_settings().is_ok());

    clear_env_vars();
}

#[test]
#[serial]
fn test_blank_key_counts_as_missing() {
    clear_env_vars();
    unsafe {
        env::set_var("ANTHROPIC_API_KEY", "   ");
        env::set_var("OPENAI_API_KEY", "sk-test");
    }

    let err = load(&[]).unwrap().validate().unwrap_err();

    assert!(matches!(err, ConfigError::MissingCredential("ANTHROPIC_API_KEY")));

    clear_env_vars();
}

#[test]
#[serial]
fn test_well_known_env_vars() {
    clear_env_vars();
    unsafe {
        env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("OPENAI_MODEL", "gpt-4o");
    }

    let config = load(&[]).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.openai.model, "gpt-4o");
    let settings = config.claude_settings().unwrap();
    assert_eq!(settings.api_key, "sk-ant-test");
    assert!(!format!("{settings:?}").contains("sk-ant-test"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_prefixed_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("MCP_CLIENT__CONVERSATION__MAX_MODEL_ROUNDS", "5");
        env::set_var("MCP_CLIENT__OPENAI__BASE_URL", "http://localhost:8080");
    }

    let config = load(&[]).unwrap();

    assert_eq!(config.conversation.max_model_rounds, Some(5));
    assert_eq!(config.openai.base_url, "http://localhost:8080");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("client.toml");
    fs::write(
        &file_path,
        r#"
[anthropic]
model = "claude-3-haiku-20240307"

[conversation]
tool_timeout_secs = 30
"#,
    )
    .unwrap();

    let config = load(&["--config", file_path.to_str().unwrap()]).unwrap();

    assert_eq!(config.anthropic.model, "claude-3-haiku-20240307");
    assert_eq!(
        config.conversation.tool_timeout(),
        Some(std::time::Duration::from_secs(30))
    );
    // Untouched keys keep their defaults
    assert_eq!(config.openai.model, "gpt-4o-mini");
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_an_error() {
    clear_env_vars();

    let result = load(&["--config", "/nonexistent/client.toml"]);

    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial]
fn test_cli_flags_override() {
    clear_env_vars();
    unsafe {
        env::set_var("MCP_CLIENT_LOG_FILE", "from-env.log");
    }

    let config = load(&["--no-confirm", "--log-file", "chat.log"]).unwrap();

    assert!(!config.conversation.confirm_model_calls);
    assert_eq!(config.audit.log_file, "chat.log");

    clear_env_vars();
}

#[test]
#[serial]
fn test_log_file_from_env() {
    clear_env_vars();
    unsafe {
        env::set_var("MCP_CLIENT_LOG_FILE", "from-env.log");
    }

    let config = load(&[]).unwrap();

    assert_eq!(config.audit.log_file, "from-env.log");

    clear_env_vars();
}

#[test]
#[serial]
fn test_audit_fallback_when_config_fails() {
    clear_env_vars();

    let cli = Cli::try_parse_from([
        "mcp-chat-client",
        "server.py",
        "--config",
        "/nonexistent/client.toml",
        "--log-file",
        "early.log",
    ])
    .unwrap();

    assert!(AppConfig::from_cli(&cli).is_err());
    let audit = AuditConfig::from_cli(&cli);
    assert_eq!(audit.log_file, "early.log");
    assert_eq!(audit.console_filter, "warn");
}

#[test]
#[serial]
fn test_audit_fallback_defaults_match_config_defaults() {
    clear_env_vars();

    let cli = Cli::try_parse_from(["mcp-chat-client", "server.py"]).unwrap();

    let fallback = AuditConfig::from_cli(&cli);
    let loaded = AppConfig::from_cli(&cli).unwrap().audit;
    assert_eq!(fallback.log_file, loaded.log_file);
    assert_eq!(fallback.console_filter, loaded.console_filter);
}
