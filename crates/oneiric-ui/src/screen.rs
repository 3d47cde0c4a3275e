//! Top-level screen selection and the static screens.

use console::style;

use oneiric_core::ApiKeyState;

pub const APP_TITLE: &str = "Пророческий Дневник";
pub const GATE_EXPLANATION: &str = "Для работы с моделями Gemini 3 Pro необходимо войти в Google аккаунт и выбрать проект с включенным биллингом.";
pub const GATE_ACTION: &str = "Введите /select, чтобы указать API-ключ.";
pub const BILLING_DOCS_URL: &str = "https://ai.google.dev/gemini-api/docs/billing";
pub const PRIVACY_NOTE: &str =
    "Ваши данные защищены и используются только для авторизации запросов к API.";

pub const CHAT_TITLE: &str = "Толкователь Снов";
pub const CHAT_SUBTITLE: &str = "Опишите свой сон или задайте вопрос о символах";

/// Which screen the terminal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Credential state not yet known: draw nothing.
    Blank,
    /// No key selected: show the gate.
    Gate,
    Chat,
}

impl Screen {
    pub fn for_state(state: ApiKeyState) -> Self {
        match state {
            ApiKeyState::Unknown => Screen::Blank,
            ApiKeyState::Gated => Screen::Gate,
            ApiKeyState::Authorized => Screen::Chat,
        }
    }
}

/// The credential gate, wrapped to `width`.
pub fn render_gate(width: usize) -> String {
    let width = width.max(20);
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", style(APP_TITLE).magenta().bold()));
    for line in textwrap::wrap(GATE_EXPLANATION, width) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format!("{}\n\n", style(GATE_ACTION).cyan().bold()));
    out.push_str(&format!(
        "Документация по биллингу:\n{}\n",
        style(BILLING_DOCS_URL).underlined()
    ));
    for line in textwrap::wrap(PRIVACY_NOTE, width) {
        out.push_str(&format!("{}\n", style(line).dim()));
    }
    out
}

/// Chat header line pair.
pub fn render_chat_header() -> String {
    format!(
        "{}\n{}\n",
        style(format!("✦ {}", CHAT_TITLE)).magenta().bold(),
        style(CHAT_SUBTITLE).dim()
    )
}
