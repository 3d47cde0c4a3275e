//! End-to-end session flow with the terminal credential bridge.

use std::sync::Arc;

use oneiric_core::{ApiKeyState, CredentialSource, CredentialStore};
use oneiric_gemini::{GeminiError, MockInterpretationService};
use oneiric_session::controller::{KEY_EXPIRED_NOTICE, TURN_ERROR_MESSAGE};
use oneiric_session::{
    CollectingNotifier, FixedConfirmer, ScriptedPrompt, SessionController, TerminalKeyProvider,
    TurnOutcome,
};

#[tokio::test]
async fn test_gate_chat_and_reselect_cycle() {
    let store = CredentialStore::new();
    let prompt = ScriptedPrompt::new(["first-key", "second-key"]);
    let service = MockInterpretationService::new();
    let notifier = CollectingNotifier::new();

    let controller = SessionController::new(
        service.clone(),
        Some(TerminalKeyProvider::new(store.clone(), prompt)),
        Arc::new(notifier.clone()),
    );

    // No key in the store: the gate is shown.
    assert_eq!(controller.probe_credentials().await, ApiKeyState::Gated);

    // Entering a key opens the chat and makes the key visible to the client.
    assert_eq!(
        controller.select_credentials().await.unwrap(),
        ApiKeyState::Authorized
    );
    assert_eq!(store.api_key().as_deref(), Some("first-key"));

    service.push_reply(Ok("Река означает поток жизни".into()));
    assert!(matches!(
        controller.send_message("Мне снилась река").await.unwrap(),
        TurnOutcome::Replied(_)
    ));

    // The key expires mid-conversation.
    service.push_reply(Err(GeminiError::InvalidCredential));
    assert_eq!(
        controller.send_message("А мост?").await.unwrap(),
        TurnOutcome::CredentialRejected
    );
    assert_eq!(controller.api_key_state(), ApiKeyState::Gated);
    assert_eq!(notifier.notices(), vec![KEY_EXPIRED_NOTICE.to_string()]);

    // History survives the trip through the gate.
    let history = controller.snapshot().history;
    assert_eq!(history.len(), 4);
    assert_eq!(history[3].text(), TURN_ERROR_MESSAGE);

    controller.select_credentials().await.unwrap();
    assert_eq!(store.api_key().as_deref(), Some("second-key"));
    controller.send_message("А мост?").await.unwrap();

    // The retried turn carries the whole transcript, error message included.
    let turns = service.turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[2].history.len(), 4);
}

#[tokio::test]
async fn test_reset_then_fresh_conversation() {
    let store = CredentialStore::new();
    store.set("key");
    let service = MockInterpretationService::new();
    let controller = SessionController::new(
        service.clone(),
        Some(TerminalKeyProvider::new(store, ScriptedPrompt::default())),
        Arc::new(CollectingNotifier::new()),
    );
    assert_eq!(controller.probe_credentials().await, ApiKeyState::Authorized);

    controller.send_message("старый сон").await.unwrap();
    assert!(controller.reset(&FixedConfirmer::new(true)).await);
    controller.send_message("новый сон").await.unwrap();

    let turns = service.turns();
    assert!(turns[1].history.is_empty());
    assert_eq!(controller.snapshot().history.len(), 2);
}
