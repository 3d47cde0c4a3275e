//! HTTP client for the Gemini `generateContent` endpoint.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use oneiric_core::config::GeminiConfig;
use oneiric_core::{
    ChatMessage, CredentialSource, DreamAnalysis, GeneratedImage, ImageSize, Recording,
};

use crate::error::GeminiError;
use crate::prompts::{
    analysis_schema, ANALYSIS_INSTRUCTION, AUDIO_ANALYSIS_PREFIX, EMPTY_REPLY_FALLBACK,
    IMAGE_STYLE_SUFFIX, INTERPRETER_PERSONA, TRANSCRIPTION_INSTRUCTION,
};
use crate::service::{DreamInput, InterpretationService};
use crate::wire::{
    Content, GenerateRequest, GenerateResponse, GenerationConfig, ImageConfig, InlineData, Part,
};

/// Encode a recording as a base64 inline data part.
pub fn encode_audio(recording: &Recording) -> InlineData {
    InlineData {
        mime_type: recording.effective_mime_type().to_string(),
        data: STANDARD.encode(&recording.bytes),
    }
}

/// Gemini-backed [`InterpretationService`].
///
/// Holds no API key of its own; the key is read from the credential source
/// on every request.
pub struct GeminiClient {
    http: reqwest::Client,
    credentials: Arc<dyn CredentialSource>,
    base_url: String,
    chat_model: String,
    transcription_model: String,
    analysis_model: String,
    image_model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("transcription_model", &self.transcription_model)
            .field("analysis_model", &self.analysis_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(
        config: &GeminiConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            transcription_model: config.transcription_model.clone(),
            analysis_model: config.analysis_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn api_key(&self) -> Result<String, GeminiError> {
        self.credentials
            .api_key()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GeminiError::MissingCredential)
    }

    /// Issue one `generateContent` call.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError> {
        let api_key = self.api_key()?;

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model, "Gemini request failed");
            return Err(GeminiError::from_error_body(status.as_u16(), &body));
        }

        let body = response.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::Decode(e.to_string()))?;

        if let Some(err) = &parsed.error {
            tracing::warn!(code = err.code, model, "Gemini returned an error payload");
            let raw = serde_json::json!({ "error": { "message": err.message } }).to_string();
            return Err(GeminiError::from_error_body(err.code, &raw));
        }

        Ok(parsed)
    }

    fn analysis_request(&self, input: DreamInput) -> GenerateRequest {
        let parts = match input {
            DreamInput::Text(text) => vec![Part::text(ANALYSIS_INSTRUCTION), Part::text(&text)],
            DreamInput::Audio(recording) => vec![
                Part::InlineData {
                    inline_data: encode_audio(&recording),
                },
                Part::text(AUDIO_ANALYSIS_PREFIX),
                Part::text(ANALYSIS_INSTRUCTION),
            ],
        };
        GenerateRequest {
            contents: vec![Content::user(parts)],
            system_instruction: Some(Content::system(INTERPRETER_PERSONA)),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(analysis_schema()),
                ..Default::default()
            }),
        }
    }
}

impl InterpretationService for GeminiClient {
    async fn transcribe(&self, recording: Recording) -> Result<String, GeminiError> {
        let inline_data = encode_audio(&recording);
        tracing::debug!(
            bytes = recording.bytes.len(),
            mime_type = %inline_data.mime_type,
            "Transcribing recording"
        );
        drop(recording);

        let request = GenerateRequest {
            contents: vec![Content::user(vec![
                Part::InlineData { inline_data },
                Part::text(TRANSCRIPTION_INSTRUCTION),
            ])],
            system_instruction: None,
            generation_config: None,
        };

        let response = self.generate(&self.transcription_model, &request).await?;
        let text = response.text().unwrap_or_default();
        tracing::info!(text_len = text.len(), "Recording transcribed");
        Ok(text)
    }

    async fn send_turn(&self, history: &[ChatMessage], message: &str) -> Result<String, GeminiError> {
        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
        contents.push(Content::user(vec![Part::text(message)]));

        let request = GenerateRequest {
            contents,
            system_instruction: Some(Content::system(INTERPRETER_PERSONA)),
            generation_config: None,
        };

        tracing::debug!(history_len = history.len(), "Sending chat turn");
        let response = self.generate(&self.chat_model, &request).await?;
        Ok(response
            .text()
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string()))
    }

    async fn analyze_dream(&self, input: DreamInput) -> Result<DreamAnalysis, GeminiError> {
        let request = self.analysis_request(input);
        let response = self.generate(&self.analysis_model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| GeminiError::Decode("analysis response carried no text".into()))?;
        let analysis: DreamAnalysis =
            serde_json::from_str(&text).map_err(|e| GeminiError::Decode(e.to_string()))?;
        tracing::info!(
            title = %analysis.title,
            symbols = analysis.key_symbols.len(),
            "Dream analysis received"
        );
        Ok(analysis)
    }

    async fn generate_image(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<GeneratedImage, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content::user(vec![Part::text(&format!(
                "{} {}",
                prompt.trim(),
                IMAGE_STYLE_SUFFIX
            ))])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                image_config: Some(ImageConfig {
                    image_size: size.as_str().to_string(),
                    aspect_ratio: "16:9".to_string(),
                }),
                ..Default::default()
            }),
        };

        let response = self.generate(&self.image_model, &request).await?;
        let inline = response.inline_data().ok_or(GeminiError::NoImage)?;
        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| GeminiError::Decode(e.to_string()))?;
        tracing::info!(bytes = bytes.len(), size = %size, "Dream image generated");
        Ok(GeneratedImage {
            bytes,
            mime_type: inline.mime_type.clone(),
        })
    }
}
