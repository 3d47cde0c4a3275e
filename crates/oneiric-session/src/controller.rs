//! Conversation session controller.
//!
//! Owns the credential gate, the append-only transcript and the single
//! in-flight request flag. Key state transitions:
//! - Unknown -> Gated | Authorized (one-shot capability probe)
//! - Gated -> Authorized (selection UI closed, optimistic)
//! - Authorized -> Gated (confirmed key change, or the service rejecting the key)
//!
//! A confirmed reset bumps the generation counter; replies that resolve
//! afterwards are dropped instead of landing in the new conversation.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use oneiric_core::{ApiKeyState, ChatMessage, DreamAnalysis, GeneratedImage, ImageSize};
use oneiric_gemini::{DreamInput, GeminiError, InterpretationService};

use crate::bridge::{Confirmer, CredentialProvider, Notifier};
use crate::error::SessionError;

/// Model message appended when a chat turn fails.
pub const TURN_ERROR_MESSAGE: &str = "Произошла ошибка. Пожалуйста, проверьте настройки доступа.";

/// Notice shown when the service rejects the selected key.
pub const KEY_EXPIRED_NOTICE: &str =
    "Срок действия ключа истек или проект не найден. Пожалуйста, выберите ключ заново.";

pub const RESET_PROMPT: &str = "Начать новый разговор?";

pub const CHANGE_KEY_PROMPT: &str = "Сменить ключ доступа?";

// =============================================================================
// Outcomes and snapshots
// =============================================================================

/// How a chat turn ended. Failures are already reflected in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Replied(String),
    /// Generic failure; the error message was appended.
    Failed(GeminiError),
    /// The key was rejected; the session is back at the gate.
    CredentialRejected,
    /// A reset happened while the turn was in flight; the reply was dropped.
    Discarded,
}

/// Illustration state of a published analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStatus {
    Pending,
    Ready(GeneratedImage),
    /// Generation failed; the analysis stands without a picture.
    Unavailable,
    /// Images are disabled or the analysis had no prompt.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    pub analysis: DreamAnalysis,
    pub image: ImageStatus,
}

/// How an analysis request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Published at this index of [`SessionSnapshot::analyses`].
    Completed(usize),
    Failed(GeminiError),
    CredentialRejected,
    Discarded,
}

/// Immutable copy of the session for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub api_key: ApiKeyState,
    pub history: Vec<ChatMessage>,
    pub processing: bool,
    pub analyses: Vec<AnalysisEntry>,
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Debug, Default)]
struct SessionState {
    api_key: ApiKeyState,
    history: Vec<ChatMessage>,
    processing: bool,
    analyses: Vec<AnalysisEntry>,
    generation: u64,
}

impl SessionState {
    fn transition(&mut self, target: ApiKeyState) -> Result<(), SessionError> {
        if self.api_key.can_transition_to(&target) {
            debug!("Key state: {} -> {}", self.api_key, target);
            self.api_key = target;
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.api_key,
                to: target,
            })
        }
    }
}

/// Clears the in-flight flag however the request ends, including when its
/// future is dropped.
struct ProcessingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.processing = false;
        }
    }
}

/// Drives one conversation against an [`InterpretationService`].
pub struct SessionController<S, P> {
    service: S,
    provider: Option<P>,
    notifier: Arc<dyn Notifier>,
    image_size: ImageSize,
    generate_images: bool,
    state: Mutex<SessionState>,
}

impl<S, P> SessionController<S, P>
where
    S: InterpretationService,
    P: CredentialProvider,
{
    /// A session in the `Unknown` key state with an empty transcript.
    ///
    /// `provider` is `None` when the host offers no credential bridge; the
    /// session then stays gated.
    pub fn new(service: S, provider: Option<P>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service,
            provider,
            notifier,
            image_size: ImageSize::default(),
            generate_images: true,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Illustration settings for [`analyze`](Self::analyze).
    pub fn with_images(mut self, size: ImageSize, enabled: bool) -> Self {
        self.image_size = size;
        self.generate_images = enabled;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state mutex poisoned")
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            api_key: state.api_key,
            history: state.history.clone(),
            processing: state.processing,
            analyses: state.analyses.clone(),
        }
    }

    pub fn api_key_state(&self) -> ApiKeyState {
        self.lock().api_key
    }

    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    // -------------------------------------------------------------------------
    // Credential gate
    // -------------------------------------------------------------------------

    /// Resolve the `Unknown` state with a single capability probe.
    ///
    /// Later calls return the current state without probing again.
    pub async fn probe_credentials(&self) -> ApiKeyState {
        let current = self.api_key_state();
        if current != ApiKeyState::Unknown {
            return current;
        }

        let selected = match &self.provider {
            Some(provider) => match provider.has_selected_api_key().await {
                Ok(selected) => selected,
                Err(e) => {
                    warn!(error = %e, "Credential probe failed");
                    false
                }
            },
            None => {
                info!("No credential provider available");
                false
            }
        };

        let target = if selected {
            ApiKeyState::Authorized
        } else {
            ApiKeyState::Gated
        };
        let mut state = self.lock();
        if state.api_key == ApiKeyState::Unknown {
            // Unknown -> Gated | Authorized is always valid.
            let _ = state.transition(target);
        }
        info!(state = %state.api_key, "Credential probe complete");
        state.api_key
    }

    /// Open the provider's selection UI and assume success once it closes.
    ///
    /// The provider cannot confirm a selection reliably, so there is no
    /// re-probe. A provider failure is logged and the gate stays closed.
    pub async fn select_credentials(&self) -> Result<ApiKeyState, SessionError> {
        let current = self.api_key_state();
        if current != ApiKeyState::Gated {
            return Err(SessionError::InvalidTransition {
                from: current,
                to: ApiKeyState::Authorized,
            });
        }

        let Some(provider) = &self.provider else {
            info!("Key selection requested without a credential provider");
            return Ok(current);
        };

        if let Err(e) = provider.open_select_key().await {
            warn!(error = %e, "API key selection failed");
            return Ok(self.api_key_state());
        }

        let mut state = self.lock();
        if state.api_key == ApiKeyState::Gated {
            state.transition(ApiKeyState::Authorized)?;
            info!("API key selected");
        }
        Ok(state.api_key)
    }

    /// Return to the gate after the user confirms.
    pub async fn change_credentials<C: Confirmer>(
        &self,
        confirmer: &C,
    ) -> Result<bool, SessionError> {
        let current = self.api_key_state();
        if current != ApiKeyState::Authorized {
            return Err(SessionError::NotAuthorized(current));
        }
        if !confirmer.confirm(CHANGE_KEY_PROMPT).await {
            return Ok(false);
        }
        let mut state = self.lock();
        if state.api_key == ApiKeyState::Authorized {
            state.transition(ApiKeyState::Gated)?;
        }
        info!("API key change requested");
        Ok(true)
    }

    /// Return to the gate because the service refused the key outside a
    /// controller request, for example during transcription.
    pub fn credential_rejected(&self) {
        info!("Key rejected by a direct service call");
        self.reject_credentials();
    }

    fn reject_credentials(&self) {
        {
            let mut state = self.lock();
            if state.api_key == ApiKeyState::Authorized {
                let _ = state.transition(ApiKeyState::Gated);
            }
        }
        warn!("Service rejected the API key");
        self.notifier.notify(KEY_EXPIRED_NOTICE);
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Claim the single in-flight slot. Returns the current generation.
    fn begin_request(&self, state: &mut SessionState) -> Result<u64, SessionError> {
        if state.api_key != ApiKeyState::Authorized {
            return Err(SessionError::NotAuthorized(state.api_key));
        }
        if state.processing {
            return Err(SessionError::Busy);
        }
        state.processing = true;
        Ok(state.generation)
    }

    /// Send one chat turn.
    ///
    /// The user message is appended before the service is called. Rejected
    /// requests (gate closed, blank text, another request in flight) leave
    /// the session untouched.
    pub async fn send_message(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let (prior, generation) = {
            let mut state = self.lock();
            let generation = self.begin_request(&mut state)?;
            let prior = state.history.clone();
            state.history.push(ChatMessage::user(text));
            (prior, generation)
        };
        let _guard = ProcessingGuard { state: &self.state };
        debug!(history_len = prior.len(), "Sending chat turn");

        let result = self.service.send_turn(&prior, text).await;

        let mut state = self.lock();
        let current = state.generation == generation;
        match result {
            Ok(_) if !current => {
                debug!("Reply arrived after reset; discarded");
                Ok(TurnOutcome::Discarded)
            }
            Ok(reply) => {
                state.history.push(ChatMessage::model(reply.clone()));
                Ok(TurnOutcome::Replied(reply))
            }
            Err(e) => {
                warn!(error = %e, "Chat turn failed");
                if current {
                    state.history.push(ChatMessage::model(TURN_ERROR_MESSAGE));
                }
                drop(state);
                // A rejected key gates the session even when the transcript moved on.
                if e.is_credential_failure() {
                    self.reject_credentials();
                    Ok(TurnOutcome::CredentialRejected)
                } else if current {
                    Ok(TurnOutcome::Failed(e))
                } else {
                    Ok(TurnOutcome::Discarded)
                }
            }
        }
    }

    /// Run a structured analysis and, when enabled, illustrate it.
    ///
    /// The analysis is published with a pending image as soon as it
    /// arrives; the picture is attached when ready. Image failures are
    /// logged and never fail the analysis.
    pub async fn analyze(&self, input: DreamInput) -> Result<AnalysisOutcome, SessionError> {
        if let DreamInput::Text(text) = &input {
            if text.trim().is_empty() {
                return Err(SessionError::EmptyMessage);
            }
        }

        let generation = {
            let mut state = self.lock();
            self.begin_request(&mut state)?
        };
        let _guard = ProcessingGuard { state: &self.state };

        let analysis = match self.service.analyze_dream(input).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Dream analysis failed");
                if e.is_credential_failure() {
                    self.reject_credentials();
                    return Ok(AnalysisOutcome::CredentialRejected);
                }
                if self.lock().generation != generation {
                    return Ok(AnalysisOutcome::Discarded);
                }
                return Ok(AnalysisOutcome::Failed(e));
            }
        };

        let wants_image = self.generate_images && !analysis.image_prompt.trim().is_empty();
        let prompt = analysis.image_prompt.clone();
        let index = {
            let mut state = self.lock();
            if state.generation != generation {
                return Ok(AnalysisOutcome::Discarded);
            }
            state.analyses.push(AnalysisEntry {
                analysis,
                image: if wants_image {
                    ImageStatus::Pending
                } else {
                    ImageStatus::Skipped
                },
            });
            state.analyses.len() - 1
        };
        info!(index, "Dream analysis published");

        if !wants_image {
            return Ok(AnalysisOutcome::Completed(index));
        }

        let image = self.service.generate_image(&prompt, self.image_size).await;
        let rejected = matches!(&image, Err(e) if e.is_credential_failure());
        let outcome = {
            let mut state = self.lock();
            if state.generation != generation {
                AnalysisOutcome::Discarded
            } else {
                state.analyses[index].image = match image {
                    Ok(image) => {
                        debug!(bytes = image.bytes.len(), "Dream image attached");
                        ImageStatus::Ready(image)
                    }
                    Err(e) => {
                        warn!(error = %e, "Dream image generation failed");
                        ImageStatus::Unavailable
                    }
                };
                AnalysisOutcome::Completed(index)
            }
        };
        // The analysis stands; only the gate reacts to a rejected key.
        if rejected {
            self.reject_credentials();
        }
        Ok(outcome)
    }

    /// Clear the conversation after the user confirms. Returns whether it
    /// was cleared.
    pub async fn reset<C: Confirmer>(&self, confirmer: &C) -> bool {
        if !confirmer.confirm(RESET_PROMPT).await {
            return false;
        }
        let mut state = self.lock();
        state.history.clear();
        state.analyses.clear();
        state.generation += 1;
        info!(generation = state.generation, "Conversation reset");
        true
    }
}
