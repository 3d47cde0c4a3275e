//! Fixed instructions sent to the remote models.

/// Persona of the dream interpreter. All replies are in Russian.
pub const INTERPRETER_PERSONA: &str = "Вы — мудрый толкователь снов, вдохновленный учениями \
Джона Пола Джексона и библейской символикой. Помогайте человеку понять его сон через \
архетипы и символы, бережно и с сочувствием. Отвечайте на РУССКОМ языке. Будьте проницательны.";

/// Reply used when the model answers a chat turn with no text.
pub const EMPTY_REPLY_FALLBACK: &str = "Я слушаю...";

/// Instruction accompanying recorded audio.
pub const TRANSCRIPTION_INSTRUCTION: &str =
    "Transcribe the following audio accurately in Russian. Return ONLY the transcribed text.";

/// Instruction for structured dream analysis.
pub const ANALYSIS_INSTRUCTION: &str = "Проанализируй сон как толкователь снов в традиции \
Джона Пола Джексона и библейской символики. Верни JSON строго по схеме: transcription \
(дословный текст сна), title (короткое поэтичное название), summary (одно предложение), \
interpretation (подробное толкование), keySymbols (ключевые символы и их значения), \
emotions (интенсивность от 0 до 100 для fear, joy, confusion, peace, urgency, insight) и \
imagePrompt (описание сцены сна на английском для генерации изображения). Все поля, кроме \
imagePrompt, на русском языке.";

/// Instruction prefix for dream analysis from recorded audio.
pub const AUDIO_ANALYSIS_PREFIX: &str =
    "Сначала точно расшифруй аудиозапись сна на русском языке, затем выполни анализ.";

/// Style suffix appended to the analysis image prompt.
pub const IMAGE_STYLE_SUFFIX: &str =
    "Surreal, dreamlike, ethereal lighting, symbolic, highly detailed digital painting.";

/// Response schema for [`oneiric_core::DreamAnalysis`], in the service's
/// OpenAPI subset.
pub fn analysis_schema() -> serde_json::Value {
    let number = serde_json::json!({ "type": "NUMBER" });
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "transcription": { "type": "STRING" },
            "title": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "interpretation": { "type": "STRING" },
            "keySymbols": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "symbol": { "type": "STRING" },
                        "meaning": { "type": "STRING" }
                    },
                    "required": ["symbol", "meaning"]
                }
            },
            "emotions": {
                "type": "OBJECT",
                "properties": {
                    "fear": number,
                    "joy": number,
                    "confusion": number,
                    "peace": number,
                    "urgency": number,
                    "insight": number
                }
            },
            "imagePrompt": { "type": "STRING" }
        },
        "required": [
            "transcription",
            "title",
            "summary",
            "interpretation",
            "keySymbols",
            "emotions",
            "imagePrompt"
        ]
    })
}
