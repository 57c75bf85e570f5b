//! Transcription trait and test double.

use crate::defaults;
use crate::error::{Result, VoxgateError};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Trait for speech-to-text transcription.
///
/// Implementations may block for the duration of inference; the pipeline
/// schedules calls on a dedicated thread so capture never waits on them.
pub trait Transcriber: Send + Sync {
    /// Transcribe one segment of audio to text.
    ///
    /// # Arguments
    /// * `audio` - Mono f32 samples normalized to [-1.0, 1.0] at 16kHz
    /// * `language` - Language hint ("en", "de", ... or "auto")
    ///
    /// # Returns
    /// Transcribed text (possibly empty) or an error.
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String>;

    /// Get the name of the loaded model.
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready.
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across pipelines.
impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String> {
        (**self).transcribe(audio, language)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Configuration for transcriber initialization.
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub model_path: PathBuf,
    pub language: String,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(""),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Transcriber that recognizes nothing.
///
/// Used when no model is configured: segments are still detected and
/// probability events still flow, but every transcript is empty and gets
/// dropped by the output filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranscriber;

impl Transcriber for NoopTranscriber {
    fn transcribe(&self, _audio: &[f32], _language: &str) -> Result<String> {
        Ok(String::new())
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Mock transcriber for testing.
///
/// Returns a fixed response, or plays through a scripted sequence of
/// responses (repeating the last). Records the audio lengths and language
/// hints it was called with.
pub struct MockTranscriber {
    model_name: String,
    responses: Mutex<VecDeque<String>>,
    last_response: Mutex<String>,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(usize, String)>>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings.
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            last_response: Mutex::new("mock transcription".to_string()),
            should_fail: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Configure the mock to return a specific response on every call.
    pub fn with_response(self, response: &str) -> Self {
        if let Ok(mut last) = self.last_response.lock() {
            *last = response.to_string();
        }
        if let Ok(mut responses) = self.responses.lock() {
            responses.clear();
        }
        self
    }

    /// Configure the mock to play through `responses` in order, repeating
    /// the last one afterwards.
    pub fn with_responses(self, responses: &[&str]) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            *queue = responses.iter().map(|s| s.to_string()).collect();
        }
        if let (Some(last), Ok(mut guard)) = (responses.last(), self.last_response.lock()) {
            *guard = last.to_string();
        }
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to sleep before answering, simulating inference.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of transcribe calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Language hints seen so far, in call order.
    pub fn languages_seen(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default()
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((audio.len(), language.to_string()));
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxgateError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }
        if let Ok(mut responses) = self.responses.lock()
            && let Some(next) = responses.pop_front()
        {
            return Ok(next);
        }
        Ok(self
            .last_response
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
