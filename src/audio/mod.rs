//! Audio input: sources, WAV replay, and frame re-chunking.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod frame_queue;
pub mod source;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::{CpalFrameSource, list_devices, suppress_audio_warnings};
pub use frame_queue::FrameQueue;
pub use source::{FramePhase, FrameSource, MockFrameSource, SourceConfig};
pub use wav::WavFrameSource;
