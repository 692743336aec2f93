use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for the log file when `RUST_LOG` is unset.
const FILE_FILTER: &str = "info,mcp_chat_client=debug,audit=debug";

/// Initialize logging.
///
/// Configures:
/// - a compact console layer on stderr, filtered by `console_filter`
///   (kept quiet by default so prompts stay readable).
/// - a non-ANSI layer appending every event to `log_file`, filtered by
///   `RUST_LOG` or [`FILE_FILTER`].
///
/// If the log file cannot be opened, only the console layer is installed.
pub fn init(log_file: &Path, console_filter: &str) {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(EnvFilter::new(console_filter));

    let (file_layer, open_error) = match OpenOptions::new().create(true).append(true).open(log_file)
    {
        Ok(file) => {
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_writer(Mutex::new(file))
                .with_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(FILE_FILTER)),
                );
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!(
            path = %log_file.display(),
            error = %e,
            "Audit log file unavailable, logging to console only"
        );
    }
}
