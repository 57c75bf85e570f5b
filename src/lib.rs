//! voxgate - Continuous speech segmentation and transcription pipeline
//!
//! Captures a live microphone stream, scores every frame for speech
//! likelihood, isolates complete utterances with pre/post-roll padding and
//! silence debounce, transcribes them, and broadcasts probability and
//! transcript events to subscribers.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod broadcast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod detector;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod scorer;
pub mod stt;
pub mod sys;

// Core traits (source → score → transcribe → deliver)
pub use audio::source::FrameSource;
pub use broadcast::{BroadcastHub, CollectorSubscriber, StdoutSubscriber, Subscriber, SubscriberId};
pub use scorer::{EnergyScorer, SpeechScorer};
pub use stt::transcriber::Transcriber;

// Pipeline
pub use pipeline::orchestrator::{
    Pipeline, PipelineConfig, PipelineController, PipelineHandle, SourceFactory,
};

// Detection
pub use detector::{DetectorConfig, DetectorState, SpeechDetector};

// Events
pub use events::PipelineEvent;

// Error handling
pub use error::{Result, VoxgateError};

// Config
pub use config::Config;

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
