//! HTTP-level tests for the Gemini client against a mock server.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use oneiric_core::config::GeminiConfig;
use oneiric_core::{ChatMessage, CredentialStore, ImageSize, Recording};
use oneiric_gemini::prompts::EMPTY_REPLY_FALLBACK;
use oneiric_gemini::{DreamInput, GeminiClient, GeminiError, InterpretationService};

// =============================================================================
// Helpers
// =============================================================================

const CHAT_PATH: &str = "/models/gemini-3-pro-preview:generateContent";
const TRANSCRIBE_PATH: &str = "/models/gemini-2.5-flash-preview-09-2025:generateContent";
const ANALYSIS_PATH: &str = "/models/gemini-2.5-flash:generateContent";
const IMAGE_PATH: &str = "/models/gemini-3-pro-image-preview:generateContent";

fn text_response(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

fn client(server: &MockServer, store: &CredentialStore) -> GeminiClient {
    GeminiClient::new(&GeminiConfig::default(), Arc::new(store.clone()))
        .unwrap()
        .with_base_url(&server.uri())
}

fn keyed_store(key: &str) -> CredentialStore {
    let store = CredentialStore::new();
    store.set(key);
    store
}

fn body_of(request: &Request) -> serde_json::Value {
    serde_json::from_slice(&request.body).unwrap()
}

// =============================================================================
// send_turn
// =============================================================================

#[tokio::test]
async fn test_send_turn_replays_history_and_persona() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("x-goog-api-key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Толкование")))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        ChatMessage::user("Мне снилась вода"),
        ChatMessage::model("Вода символизирует дух"),
    ];
    let reply = client(&server, &keyed_store("key-1"))
        .send_turn(&history, "А что значит лодка?")
        .await
        .unwrap();
    assert_eq!(reply, "Толкование");

    let requests = server.received_requests().await.unwrap();
    let body = body_of(&requests[0]);
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[0]["parts"][0]["text"], "Мне снилась вода");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 1);
    assert_eq!(contents[2]["role"], "user");
    assert_eq!(contents[2]["parts"][0]["text"], "А что значит лодка?");
    assert!(body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("толкователь снов"));
}

#[tokio::test]
async fn test_send_turn_empty_reply_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let reply = client(&server, &keyed_store("k"))
        .send_turn(&[], "привет")
        .await
        .unwrap();
    assert_eq!(reply, EMPTY_REPLY_FALLBACK);
}

#[tokio::test]
async fn test_entity_not_found_becomes_invalid_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server, &keyed_store("stale"))
        .send_turn(&[], "hi")
        .await
        .unwrap_err();
    assert_eq!(err, GeminiError::InvalidCredential);
}

#[tokio::test]
async fn test_server_error_is_generic_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "The model is overloaded." }
        })))
        .mount(&server)
        .await;

    let err = client(&server, &keyed_store("k"))
        .send_turn(&[], "hi")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GeminiError::Api {
            status: 503,
            message: "The model is overloaded.".into()
        }
    );
    assert!(!err.is_credential_failure());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server, &keyed_store("k"))
        .send_turn(&[], "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::Decode(_)));
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("x")))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, &CredentialStore::new())
        .send_turn(&[], "hi")
        .await
        .unwrap_err();
    assert_eq!(err, GeminiError::MissingCredential);
}

#[tokio::test]
async fn test_key_change_applies_to_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-goog-api-key", "old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("old key")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-goog-api-key", "new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("new key")))
        .mount(&server)
        .await;

    let store = keyed_store("old");
    let client = client(&server, &store);
    assert_eq!(client.send_turn(&[], "1").await.unwrap(), "old key");
    store.set("new");
    assert_eq!(client.send_turn(&[], "2").await.unwrap(), "new key");
}

// =============================================================================
// transcribe
// =============================================================================

#[tokio::test]
async fn test_transcribe_sends_base64_audio_and_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRANSCRIBE_PATH))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "audio/webm", "data": "AQID" } }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Я шёл по лесу")))
        .mount(&server)
        .await;

    let text = client(&server, &keyed_store("k"))
        .transcribe(Recording::new(vec![1, 2, 3], None))
        .await
        .unwrap();
    assert_eq!(text, "Я шёл по лесу");

    let requests = server.received_requests().await.unwrap();
    let body = body_of(&requests[0]);
    let instruction = body["contents"][0]["parts"][1]["text"].as_str().unwrap();
    assert!(instruction.contains("Russian"));
}

#[tokio::test]
async fn test_transcribe_no_speech_returns_empty_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRANSCRIBE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let text = client(&server, &keyed_store("k"))
        .transcribe(Recording::new(vec![9; 16], Some("audio/wav".into())))
        .await
        .unwrap();
    assert_eq!(text, "");
}

// =============================================================================
// analyze_dream / generate_image
// =============================================================================

#[tokio::test]
async fn test_analyze_dream_parses_structured_json() {
    let analysis = json!({
        "transcription": "Я летел над морем",
        "title": "Полёт над морем",
        "summary": "Сон о свободе",
        "interpretation": "Море — это народы",
        "keySymbols": [
            { "symbol": "Море", "meaning": "Народы" },
            { "symbol": "Полёт", "meaning": "Духовный подъём" }
        ],
        "emotions": { "fear": 10, "peace": 80 },
        "imagePrompt": "a person flying over a calm sea at dawn"
    });
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ANALYSIS_PATH))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(&analysis.to_string())),
        )
        .mount(&server)
        .await;

    let result = client(&server, &keyed_store("k"))
        .analyze_dream(DreamInput::Text("Я летел над морем".into()))
        .await
        .unwrap();
    assert_eq!(result.title, "Полёт над морем");
    assert_eq!(result.key_symbols.len(), 2);
    assert_eq!(result.key_symbols[1].symbol, "Полёт");
    assert_eq!(result.emotions.fear, 10.0);
    assert_eq!(result.emotions.peace, 80.0);
    assert_eq!(result.emotions.joy, 0.0);
}

#[tokio::test]
async fn test_analyze_dream_rejects_non_json_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ANALYSIS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("sorry")))
        .mount(&server)
        .await;

    let err = client(&server, &keyed_store("k"))
        .analyze_dream(DreamInput::Text("сон".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::Decode(_)));
}

#[tokio::test]
async fn test_generate_image_decodes_inline_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .and(body_partial_json(json!({
            "generationConfig": { "imageConfig": { "imageSize": "2K" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw==" } }
            ] } }]
        })))
        .mount(&server)
        .await;

    let image = client(&server, &keyed_store("k"))
        .generate_image("a calm sea", ImageSize::Size2K)
        .await
        .unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_generate_image_without_image_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("no image")))
        .mount(&server)
        .await;

    let err = client(&server, &keyed_store("k"))
        .generate_image("x", ImageSize::Size1K)
        .await
        .unwrap_err();
    assert_eq!(err, GeminiError::NoImage);
}
