//! Parsing of lines typed at the chat prompt.

/// One line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the compose field.
    Text(String),
    /// Empty line: submit the pending draft, if any.
    Submit,
    Record,
    /// Record a dream and analyse the audio directly.
    RecordDream,
    Analyze,
    New,
    ChangeKey,
    SelectKey,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
/rec      записать сон голосом (Enter - остановить)
/dream    записать сон голосом и сразу проанализировать
/analyze  подробный анализ сна с визуализацией
/new      начать новый разговор
/key      сменить ключ доступа
/select   указать API-ключ
/quit     выход";

pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Submit;
    }
    if !trimmed.starts_with('/') {
        return Command::Text(line.trim_end_matches(['\r', '\n']).to_string());
    }

    let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
    match word.to_lowercase().as_str() {
        "/rec" | "/record" => Command::Record,
        "/dream" => Command::RecordDream,
        "/analyze" | "/analyse" => Command::Analyze,
        "/new" | "/reset" => Command::New,
        "/key" => Command::ChangeKey,
        "/select" => Command::SelectKey,
        "/help" | "/?" => Command::Help,
        "/quit" | "/exit" | "/q" => Command::Quit,
        _ => Command::Unknown(word.to_string()),
    }
}
