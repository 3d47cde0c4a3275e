//! Transcript rendering with follow-the-newest scrolling.

use console::style;

use oneiric_core::{ChatMessage, Role};

pub const EMPTY_PROMPT: &str = "\"Расскажите мне свой сон...\"";
pub const EMPTY_HINT: &str = "Я помогу раскрыть его духовный смысл и значение символов.";
pub const MODEL_LABEL: &str = "✦ John Paul Jackson Style";
pub const THINKING_INDICATOR: &str = "• • •";

/// Renders the transcript into terminal lines and keeps a viewport on it.
///
/// Whenever the number of messages (or the thinking indicator) changes, the
/// viewport jumps to the bottom so the newest entry is visible.
#[derive(Debug, Clone)]
pub struct MessageList {
    width: usize,
    viewport: usize,
    scroll_offset: usize,
    seen: Option<(usize, bool)>,
}

impl MessageList {
    pub fn new(width: usize, viewport: usize) -> Self {
        Self {
            width: width.max(20),
            viewport: viewport.max(1),
            scroll_offset: 0,
            seen: None,
        }
    }

    /// Index of the first visible line.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize, total: usize) {
        let max = total.saturating_sub(self.viewport);
        self.scroll_offset = (self.scroll_offset + lines).min(max);
    }

    /// Every line of the transcript, oldest first.
    pub fn lines(&self, messages: &[ChatMessage], processing: bool) -> Vec<String> {
        let mut lines = Vec::new();
        if messages.is_empty() && !processing {
            lines.push(style(EMPTY_PROMPT).italic().to_string());
            for line in textwrap::wrap(EMPTY_HINT, self.width) {
                lines.push(style(line).dim().to_string());
            }
            return lines;
        }

        let body_width = self.width.saturating_sub(2).max(10);
        for message in messages {
            match message.role() {
                Role::User => {
                    lines.push(style("Вы").cyan().bold().to_string());
                }
                Role::Model => {
                    lines.push(style(MODEL_LABEL).magenta().dim().to_string());
                }
            }
            for paragraph in message.text().split('\n') {
                if paragraph.is_empty() {
                    lines.push(String::new());
                    continue;
                }
                for line in textwrap::wrap(paragraph, body_width) {
                    lines.push(format!("  {}", line));
                }
            }
            lines.push(String::new());
        }
        if processing {
            lines.push(format!("  {}", style(THINKING_INDICATOR).magenta()));
        }
        lines
    }

    /// The visible window of the transcript.
    ///
    /// Snaps to the bottom when the message count or the thinking indicator
    /// changed since the previous call.
    pub fn render(&mut self, messages: &[ChatMessage], processing: bool) -> Vec<String> {
        let lines = self.lines(messages, processing);
        let current = (messages.len(), processing);
        if self.seen != Some(current) {
            self.scroll_offset = lines.len().saturating_sub(self.viewport);
            self.seen = Some(current);
        }
        let start = self.scroll_offset.min(lines.len());
        let end = (start + self.viewport).min(lines.len());
        lines[start..end].to_vec()
    }
}
