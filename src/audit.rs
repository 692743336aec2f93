//! Audit trail port.
//!
//! The conversation loop records every model exchange and tool call through
//! [`AuditLog`]. Production uses [`TracingAudit`], which forwards to `tracing`
//! under the `audit` target; [`crate::telemetry`] routes that target into the
//! append-only log file.

use tracing::Level;

/// Target used for every audit event.
pub const AUDIT_TARGET: &str = "audit";

/// Leveled, append-only record of what the client did.
///
/// Implementations must never fail or block the caller on a write error.
pub trait AuditLog: Send + Sync {
    /// Record one line at `level`.
    fn record(&self, level: Level, message: &str);

    /// Record a pretty-printed JSON block under `header`.
    fn record_json(&self, level: Level, header: &str, value: &serde_json::Value) {
        self.record(level, &pretty_block(header, value));
    }

    fn info(&self, message: &str) {
        self.record(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::ERROR, message);
    }

    fn debug(&self, message: &str) {
        self.record(Level::DEBUG, message);
    }
}

/// Render `value` between `==== header ====` rulers.
pub fn pretty_block(header: &str, value: &serde_json::Value) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("\n==== {header} ====\n{body}\n==== end {header} ====")
}

/// [`AuditLog`] backed by `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn record(&self, level: Level, message: &str) {
        // `tracing` macros need a const level.
        if level == Level::ERROR {
            tracing::error!(target: AUDIT_TARGET, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: AUDIT_TARGET, "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: AUDIT_TARGET, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: AUDIT_TARGET, "{message}");
        } else {
            tracing::trace!(target: AUDIT_TARGET, "{message}");
        }
    }
}
