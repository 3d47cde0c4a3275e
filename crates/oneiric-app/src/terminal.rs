//! Stdin/stderr adapters for the session's host seams.

use std::io::Write;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use oneiric_session::{LinePrompt, Notifier};

/// Shared reader over stdin lines.
///
/// One background task owns stdin; the chat loop and the credential and
/// confirmation prompts all take lines from the same channel.
pub struct InputLines {
    rx: Mutex<mpsc::Receiver<String>>,
}

impl InputLines {
    /// Start reading stdin on a background task.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
            tracing::debug!("Stdin closed");
        });
        Self::from_receiver(rx)
    }

    pub fn from_receiver(rx: mpsc::Receiver<String>) -> Self {
        Self { rx: Mutex::new(rx) }
    }

    /// The next line, or `None` once input is closed.
    pub async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}

impl LinePrompt for InputLines {
    async fn prompt_line(&self, prompt: &str) -> Option<String> {
        print!("{}", style(prompt).bold());
        let _ = std::io::stdout().flush();
        self.next_line().await
    }
}

/// Prints notices to stderr, out of the transcript's way.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", format_notice(message));
    }
}

fn format_notice(message: &str) -> String {
    format!("{} {}", style("!").yellow().bold(), style(message).yellow())
}
