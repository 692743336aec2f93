//! Model Context Protocol (MCP) client implementation.
//!
//! This module connects to a single stdio MCP server, discovers its tools once
//! and forwards tool calls requested by the model.
//!
//! # Launching
//!
//! The server is started from a script path: `.py` scripts run under
//! `python3` (`python` on Windows), `.js` scripts under `node`.
//!
//! ```rust,ignore
//! use mcp_chat_client::mcp::{LaunchTarget, McpConnection, ToolRegistry};
//!
//! let conn = McpConnection::connect(LaunchTarget::from_script("weather.py")?).await?;
//! let registry = ToolRegistry::discover(&conn).await?;
//! ```

pub mod connection;
pub mod invoker;
pub mod registry;
pub mod types;

pub use connection::{LaunchTarget, McpConnection, ToolServer};
pub use invoker::{RegistryInvoker, ToolInvoker};
pub use registry::ToolRegistry;
pub use types::{ToolDescriptor, ToolOutput};
