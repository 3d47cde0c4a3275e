//! Command-line flags for the `oneiric` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use oneiric_core::OneiricConfig;

/// Oneiric: a terminal dream journal that interprets dreams with Gemini.
#[derive(Parser, Debug)]
#[command(name = "oneiric", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Directory where dream illustrations are saved.
    #[arg(short = 'i', long = "image-dir")]
    pub image_dir: Option<PathBuf>,

    /// Skip illustration generation for analyses.
    #[arg(long = "no-image")]
    pub no_image: bool,

    /// Input device name, or a substring of it.
    #[arg(short = 'd', long = "device")]
    pub device: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ONEIRIC_CONFIG env var > ~/.oneiric/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ONEIRIC_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level. Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &OneiricConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    /// Fold the flags that override config values into `config`.
    pub fn apply(&self, config: &mut OneiricConfig) {
        if let Some(ref dir) = self.image_dir {
            config.ui.image_dir = dir.to_string_lossy().to_string();
        }
        if self.no_image {
            config.ui.generate_images = false;
        }
        if let Some(ref device) = self.device {
            config.audio.device_name = device.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".oneiric").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".oneiric").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::try_parse_from(["oneiric", "--config", "/tmp/o.toml"]).unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/o.toml"));
    }

    #[test]
    fn test_default_config_path_under_home() {
        let path = default_config_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_flags_override_config() {
        let args = CliArgs::try_parse_from([
            "oneiric",
            "--image-dir",
            "/tmp/dreams",
            "--no-image",
            "--device",
            "USB",
            "-l",
            "debug",
        ])
        .unwrap();
        let mut config = OneiricConfig::default();
        args.apply(&mut config);

        assert_eq!(config.ui.image_dir, "/tmp/dreams");
        assert!(!config.ui.generate_images);
        assert_eq!(config.audio.device_name, "USB");
        assert_eq!(args.resolve_log_level(&config), "debug");
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = CliArgs::try_parse_from(["oneiric"]).unwrap();
        let mut config = OneiricConfig::default();
        args.apply(&mut config);

        assert!(config.ui.generate_images);
        assert_eq!(config.audio.device_name, "default");
        assert_eq!(args.resolve_log_level(&config), "warn");
    }
}
