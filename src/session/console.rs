use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::conversation::ConfirmationGate;

/// Line-based terminal access.
#[async_trait]
pub trait Console: Send + Sync {
    /// Show `prompt` and read one line without its terminator.
    /// `None` means input is closed.
    async fn read_line(&self, prompt: &str) -> io::Result<Option<String>>;

    fn print(&self, text: &str);
}

/// [`Console`] over the process's stdin and stdout.
pub struct StdConsole {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl std::fmt::Debug for StdConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdConsole").finish_non_exhaustive()
    }
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut out = tokio::io::stdout();
        out.write_all(prompt.as_bytes()).await?;
        out.flush().await?;
        self.lines.lock().await.next_line().await
    }

    fn print(&self, text: &str) {
        println!("{text}");
    }
}

/// Gate that asks on the console before each model call. Only `y` proceeds.
#[derive(Clone)]
pub struct ConsoleGate {
    console: Arc<dyn Console>,
}

impl std::fmt::Debug for ConsoleGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleGate").finish_non_exhaustive()
    }
}

impl ConsoleGate {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl ConfirmationGate for ConsoleGate {
    async fn confirm(&self, provider: &str) -> bool {
        let prompt = format!("About to call {provider}, continue? (y/n): ");
        match self.console.read_line(&prompt).await {
            Ok(Some(answer)) => answer.trim().eq_ignore_ascii_case("y"),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation prompt failed");
                false
            }
        }
    }
}
