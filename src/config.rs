//! Configuration loading for voxgate.

use crate::defaults;
use crate::detector::DetectorConfig;
use crate::error::{Result, VoxgateError};
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub detector: DetectorSettings,
    pub stt: SttConfig,
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; None picks the best default.
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_samples: usize,
}

/// Speech segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    pub speech_threshold: f32,
    pub silence_timeout_ms: u32,
    pub pre_roll_ms: u32,
    pub post_roll_ms: u32,
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub language: String,
    /// Path to a Whisper model file (whisper feature).
    pub model_path: Option<PathBuf>,
    /// Transcripts matching any of these (case-insensitive, trimmed) are
    /// silently dropped.
    pub stop_phrases: Vec<String>,
    /// Debug: write each finalized segment to this WAV path.
    pub segment_dump_path: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_samples: defaults::FRAME_SAMPLES,
        }
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            speech_threshold: defaults::SPEECH_THRESHOLD,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
            pre_roll_ms: defaults::PRE_ROLL_MS,
            post_roll_ms: defaults::POST_ROLL_MS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            model_path: None,
            stop_phrases: defaults::default_stop_phrases(),
            segment_dump_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoxgateError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VoxgateError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if the file is missing.
    ///
    /// Only a missing file falls back to defaults; invalid TOML is still an
    /// error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(VoxgateError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Default config path: `~/.config/voxgate/config.toml`.
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voxgate").join("config.toml"))
    }

    /// Apply environment variable overrides.
    ///
    /// Supported:
    /// - `VOXGATE_LANGUAGE` → stt.language
    /// - `VOXGATE_MODEL` → stt.model_path
    /// - `VOXGATE_AUDIO_DEVICE` → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("VOXGATE_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }
        if let Ok(model) = std::env::var("VOXGATE_MODEL")
            && !model.is_empty()
        {
            self.stt.model_path = Some(PathBuf::from(model));
        }
        if let Ok(device) = std::env::var("VOXGATE_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(VoxgateError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.frame_samples == 0 {
            return Err(VoxgateError::ConfigInvalidValue {
                key: "audio.frame_samples".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.detector.speech_threshold) {
            return Err(VoxgateError::ConfigInvalidValue {
                key: "detector.speech_threshold".to_string(),
                message: "must be within 0.0..=1.0".to_string(),
            });
        }
        Ok(())
    }

    /// Build the detector configuration from this config.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            speech_threshold: self.detector.speech_threshold,
            silence_timeout_ms: self.detector.silence_timeout_ms,
            pre_roll_ms: self.detector.pre_roll_ms,
            post_roll_ms: self.detector.post_roll_ms,
            sample_rate: self.audio.sample_rate,
        }
    }

    /// Build the pipeline configuration from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            detector: self.detector_config(),
            frame_samples: self.audio.frame_samples,
            language: self.stt.language.clone(),
            stop_phrases: self.stt.stop_phrases.clone(),
            segment_dump_path: self.stt.segment_dump_path.clone(),
            ..PipelineConfig::default()
        }
    }
}
