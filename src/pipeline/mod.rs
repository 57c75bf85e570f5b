//! Audio pipeline for speech segmentation and transcription.
//!
//! Implements a multi-station pipeline where each station runs in its own
//! thread, connected by bounded crossbeam channels for backpressure.

pub mod broadcast_station;
pub mod detector_station;
pub mod error;
pub mod orchestrator;
pub mod station;
pub mod transcriber_station;
pub mod types;

pub use broadcast_station::BroadcastStation;
pub use detector_station::DetectorStation;
pub use error::{ErrorReporter, LogReporter, StationError};
pub use orchestrator::{
    Pipeline, PipelineConfig, PipelineController, PipelineHandle, SourceFactory,
};
pub use station::{Station, StationRunner};
pub use transcriber_station::TranscriberStation;
pub use types::{AudioBatch, Segment};
