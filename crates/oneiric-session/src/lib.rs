//! Oneiric Session crate - the conversation controller and its host seams.
//!
//! [`SessionController`] gates the chat behind an API key, sequences turns
//! one at a time against an [`InterpretationService`](oneiric_gemini::InterpretationService),
//! and recovers every remote failure itself so nothing reaches the
//! terminal loop as an error it has to handle.

pub mod bridge;
pub mod controller;
pub mod error;

pub use bridge::{
    CollectingNotifier, Confirmer, CredentialProvider, FixedConfirmer, LinePrompt,
    MockCredentialProvider, Notifier, PromptConfirmer, ScriptedPrompt, TerminalKeyProvider,
};
pub use controller::{
    AnalysisEntry, AnalysisOutcome, ImageStatus, SessionController, SessionSnapshot, TurnOutcome,
};
pub use error::SessionError;
