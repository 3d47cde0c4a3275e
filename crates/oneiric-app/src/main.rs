//! Oneiric application binary - composition root.
//!
//! 1. Parse flags and load configuration from TOML
//! 2. Install tracing on stderr
//! 3. Seed the process-wide credential store and build the Gemini client
//! 4. Wire the session controller to the terminal prompts
//! 5. Run the interactive chat loop

mod app;
mod cli;
mod commands;
mod images;
mod terminal;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use oneiric_core::{CredentialStore, OneiricConfig};
use oneiric_gemini::GeminiClient;
use oneiric_session::{Notifier, PromptConfirmer, SessionController, TerminalKeyProvider};

use crate::app::App;
use crate::cli::CliArgs;
use crate::images::expand_home;
use crate::terminal::{InputLines, TerminalNotifier};

#[cfg(feature = "cpal")]
type Mic = oneiric_audio::CpalMicrophone;
// Without an input backend the microphone type is never opened.
#[cfg(not(feature = "cpal"))]
type Mic = oneiric_audio::MockMicrophone;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = OneiricConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over the flag and the config file.
    let level = args.resolve_log_level(&config);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Oneiric v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Credential and remote client.
    let store = CredentialStore::from_env(&config.gemini.api_key_env);
    let service = Arc::new(GeminiClient::new(&config.gemini, Arc::new(store.clone()))?);
    tracing::info!(chat_model = %config.gemini.chat_model, "Gemini client ready");

    // Terminal seams.
    let input = Arc::new(InputLines::stdin());
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
    let provider = TerminalKeyProvider::new(store, Arc::clone(&input));
    let confirmer = PromptConfirmer::new(Arc::clone(&input));

    let controller =
        SessionController::new(Arc::clone(&service), Some(provider), Arc::clone(&notifier))
            .with_images(config.ui.image_size, config.ui.generate_images);

    let image_dir = expand_home(&config.ui.image_dir);
    let app: App<_, _, Mic, _> = App::new(
        service,
        controller,
        input,
        confirmer,
        notifier,
        &config.ui,
        image_dir,
    );

    #[cfg(feature = "cpal")]
    let app = {
        let mic = oneiric_audio::CpalMicrophone::new(config.audio.clone());
        let recorder = oneiric_audio::Recorder::new(mic, &config.audio);
        app.with_voice(oneiric_ui::VoiceCapture::new(recorder, config.audio.visualizer_fps > 0))
    };
    #[cfg(not(feature = "cpal"))]
    tracing::info!("Built without the cpal feature; voice input is disabled");

    let mut app = app;
    app.run().await;
    Ok(())
}
