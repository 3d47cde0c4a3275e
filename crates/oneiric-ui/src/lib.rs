//! Oneiric UI crate - terminal view-models and renderers.
//!
//! Everything here is plain state plus string rendering, so the
//! presentation rules (which screen shows, when input is enabled, how a
//! transcript merges, what the analysis looks like) are testable without a
//! terminal.
//!
//! # Modules
//!
//! - [`screen`]: screen selection from the key state, gate and header text
//! - [`compose`]: the compose field and its voice-input flags
//! - [`voice`]: recording handoff into transcription
//! - [`message_list`]: transcript rendering and scrolling
//! - [`analysis`]: structured analysis view and emotion radar
//! - [`bars`]: block-character bar graphs

pub mod analysis;
pub mod bars;
pub mod compose;
pub mod message_list;
pub mod screen;
pub mod voice;

pub use analysis::{radar_axes, AnalysisView, RadarAxis};
pub use bars::{render_bars, render_meter};
pub use compose::ComposeState;
pub use message_list::MessageList;
pub use screen::Screen;
pub use voice::{VoiceCapture, VoiceOutcome};
