use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OneiricError, Result};
use crate::types::ImageSize;

/// Upper bound for `audio.visualizer_fps`; the redraw period is whole milliseconds.
pub const MAX_VISUALIZER_FPS: u32 = 1000;

/// Top-level configuration for the Oneiric client.
///
/// Loaded from `~/.oneiric/config.toml` by default. The API key itself is
/// never stored here, only the environment variable that seeds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneiricConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl OneiricConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OneiricConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| OneiricError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make the client unusable.
    pub fn validate(&self) -> Result<()> {
        if self.gemini.base_url.trim().is_empty() {
            return Err(OneiricError::Config("gemini.base_url is empty".into()));
        }
        if self.gemini.timeout_secs == 0 {
            return Err(OneiricError::Config(
                "gemini.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(OneiricError::Config(
                "audio.sample_rate must be greater than 0".into(),
            ));
        }
        if !self.audio.fft_size.is_power_of_two() || self.audio.fft_size < 32 {
            return Err(OneiricError::Config(format!(
                "audio.fft_size must be a power of two >= 32, got {}",
                self.audio.fft_size
            )));
        }
        if self.audio.visualizer_fps > MAX_VISUALIZER_FPS {
            return Err(OneiricError::Config(format!(
                "audio.visualizer_fps must be at most {}, got {}",
                MAX_VISUALIZER_FPS, self.audio.visualizer_fps
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Remote model endpoints and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Base URL of the generative language API, without a trailing slash.
    pub base_url: String,
    /// Model answering chat turns.
    pub chat_model: String,
    /// Model transcribing recorded audio.
    pub transcription_model: String,
    /// Model producing structured dream analyses.
    pub analysis_model: String,
    /// Model generating dream illustrations.
    pub image_model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-3-pro-preview".to_string(),
            transcription_model: "gemini-2.5-flash-preview-09-2025".to_string(),
            analysis_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Microphone and visualiser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Name or substring of the input device; "default" for the system default.
    pub device_name: String,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Number of capture channels.
    pub channels: u16,
    /// Analyser window size in samples (power of two).
    pub fft_size: usize,
    /// Visualiser redraws per second; 0 turns the visualiser off.
    pub visualizer_fps: u32,
    /// Hard cap on a single recording, in seconds.
    pub max_recording_secs: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_name: "default".to_string(),
            sample_rate: 16000,
            channels: 1,
            fft_size: 256,
            visualizer_fps: 30,
            max_recording_secs: 300,
        }
    }
}

/// Terminal presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Resolution of generated dream illustrations.
    pub image_size: ImageSize,
    /// Directory where generated illustrations are written.
    pub image_dir: String,
    /// Whether analyses also request an illustration.
    pub generate_images: bool,
    /// Wrap width for the transcript.
    pub transcript_width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            image_size: ImageSize::Size1K,
            image_dir: "~/.oneiric/images".to_string(),
            generate_images: true,
            transcript_width: 80,
        }
    }
}
