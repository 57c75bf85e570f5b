//! Speech-to-text: transcriber trait, test double, and Whisper backend.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{MockTranscriber, NoopTranscriber, Transcriber, TranscriberConfig};
pub use whisper::{WhisperConfig, WhisperTranscriber};
