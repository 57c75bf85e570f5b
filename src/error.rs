//! Error types for voxgate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxgateError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Speech scoring errors
    #[error("Speech scoring failed: {message}")]
    Scoring { message: String },

    // Transcription errors
    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    // Event delivery errors
    #[error("Event delivery failed: {message}")]
    Delivery { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxgateError>;
