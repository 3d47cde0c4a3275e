//! Host-supplied seams: credential provider, confirmation, notices.
//!
//! The controller talks to the outside world only through these traits.
//! The terminal implementations read from a [`LinePrompt`] so the app can
//! share one stdin reader between the chat loop and the prompts.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use oneiric_core::CredentialStore;

use crate::error::SessionError;

// =============================================================================
// Traits
// =============================================================================

/// External credential selection bridge.
pub trait CredentialProvider: Send + Sync {
    /// Capability probe: is a key already selected?
    fn has_selected_api_key(&self) -> impl Future<Output = Result<bool, SessionError>> + Send;

    /// Open the provider's selection UI. Resolves when the UI closes, which
    /// does not prove a key was chosen.
    fn open_select_key(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Asks the user to confirm a destructive action.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send;
}

/// Surfaces a user-visible notice.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// One line of user input in answer to a prompt.
pub trait LinePrompt: Send + Sync {
    /// `None` when input is closed.
    fn prompt_line(&self, prompt: &str) -> impl Future<Output = Option<String>> + Send;
}

impl<T: LinePrompt> LinePrompt for Arc<T> {
    fn prompt_line(&self, prompt: &str) -> impl Future<Output = Option<String>> + Send {
        (**self).prompt_line(prompt)
    }
}

// =============================================================================
// Terminal implementations
// =============================================================================

pub const KEY_PROMPT: &str = "Введите API-ключ Gemini: ";

/// Credential bridge for the terminal.
///
/// The probe reports whether the shared [`CredentialStore`] holds a key;
/// selection reads a key from the prompt and writes it into the store, so
/// the client picks it up on its next call.
pub struct TerminalKeyProvider<L> {
    store: CredentialStore,
    prompt: L,
}

impl<L: LinePrompt> TerminalKeyProvider<L> {
    pub fn new(store: CredentialStore, prompt: L) -> Self {
        Self { store, prompt }
    }
}

impl<L: LinePrompt> CredentialProvider for TerminalKeyProvider<L> {
    async fn has_selected_api_key(&self) -> Result<bool, SessionError> {
        Ok(self.store.is_set())
    }

    async fn open_select_key(&self) -> Result<(), SessionError> {
        let line = self
            .prompt
            .prompt_line(KEY_PROMPT)
            .await
            .ok_or_else(|| SessionError::Provider("input closed".into()))?;
        if line.trim().is_empty() {
            return Err(SessionError::Provider("no key entered".into()));
        }
        self.store.set(line);
        info!("API key updated from terminal");
        Ok(())
    }
}

/// Confirms when the answer starts with `y` or `д`.
pub struct PromptConfirmer<L> {
    prompt: L,
}

impl<L: LinePrompt> PromptConfirmer<L> {
    pub fn new(prompt: L) -> Self {
        Self { prompt }
    }
}

impl<L: LinePrompt> Confirmer for PromptConfirmer<L> {
    async fn confirm(&self, prompt: &str) -> bool {
        let question = format!("{} [д/н] ", prompt);
        match self.prompt.prompt_line(&question).await {
            Some(answer) => is_affirmative(&answer),
            None => false,
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer.starts_with('y') || answer.starts_with('д')
}

// =============================================================================
// Mock implementations
// =============================================================================

/// Scripted credential provider for tests.
#[derive(Debug, Clone)]
pub struct MockCredentialProvider {
    probe: Result<bool, SessionError>,
    select: Result<(), SessionError>,
    probes: Arc<AtomicUsize>,
    selects: Arc<AtomicUsize>,
}

impl MockCredentialProvider {
    pub fn new(has_key: bool) -> Self {
        Self {
            probe: Ok(has_key),
            select: Ok(()),
            probes: Arc::new(AtomicUsize::new(0)),
            selects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_probe_error(mut self, reason: &str) -> Self {
        self.probe = Err(SessionError::Provider(reason.to_string()));
        self
    }

    pub fn with_select_error(mut self, reason: &str) -> Self {
        self.select = Err(SessionError::Provider(reason.to_string()));
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for MockCredentialProvider {
    async fn has_selected_api_key(&self) -> Result<bool, SessionError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probe.clone()
    }

    async fn open_select_key(&self) -> Result<(), SessionError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.select.clone()
    }
}

/// Confirmer with a fixed answer that records every prompt.
#[derive(Debug, Clone)]
pub struct FixedConfirmer {
    answer: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FixedConfirmer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("confirmer mutex poisoned").clone()
    }
}

impl Confirmer for FixedConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .expect("confirmer mutex poisoned")
            .push(prompt.to_string());
        self.answer
    }
}

/// Notifier that keeps every notice for inspection.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    notices: Arc<Mutex<Vec<String>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str) {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(message.to_string());
    }
}

/// Prompt that answers from a script of lines.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    lines: Arc<Mutex<VecDeque<String>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
            asked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every prompt shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("prompt mutex poisoned").clone()
    }
}

impl LinePrompt for ScriptedPrompt {
    async fn prompt_line(&self, prompt: &str) -> Option<String> {
        self.asked
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt.to_string());
        self.lines.lock().expect("prompt mutex poisoned").pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_terminal_provider_probe_follows_store() {
        let store = CredentialStore::new();
        let provider = TerminalKeyProvider::new(store.clone(), ScriptedPrompt::default());
        assert!(!provider.has_selected_api_key().await.unwrap());
        store.set("abc");
        assert!(provider.has_selected_api_key().await.unwrap());
    }

    #[tokio::test]
    async fn test_terminal_provider_writes_entered_key() {
        let store = CredentialStore::new();
        let prompt = ScriptedPrompt::new(["  my-key  "]);
        let provider = TerminalKeyProvider::new(store.clone(), prompt.clone());

        provider.open_select_key().await.unwrap();
        assert!(store.is_set());
        assert_eq!(prompt.asked(), vec![KEY_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn test_terminal_provider_blank_or_closed_input_fails() {
        let store = CredentialStore::new();
        let provider = TerminalKeyProvider::new(store.clone(), ScriptedPrompt::new(["   "]));
        assert!(matches!(
            provider.open_select_key().await,
            Err(SessionError::Provider(_))
        ));
        // Script exhausted: behaves like closed stdin.
        assert!(provider.open_select_key().await.is_err());
        assert!(!store.is_set());
    }

    #[tokio::test]
    async fn test_prompt_confirmer_answers() {
        let confirmer = PromptConfirmer::new(ScriptedPrompt::new(["да", "y", "нет", ""]));
        assert!(confirmer.confirm("?").await);
        assert!(confirmer.confirm("?").await);
        assert!(!confirmer.confirm("?").await);
        assert!(!confirmer.confirm("?").await);
        // Closed input never confirms.
        assert!(!confirmer.confirm("?").await);
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative(" Д "));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
    }

    #[tokio::test]
    async fn test_mock_provider_counts_calls() {
        let provider = MockCredentialProvider::new(false).with_select_error("closed");
        assert!(!provider.has_selected_api_key().await.unwrap());
        assert!(provider.open_select_key().await.is_err());
        assert_eq!(provider.probe_count(), 1);
        assert_eq!(provider.select_count(), 1);
    }
}
