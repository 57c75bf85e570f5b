//! Transcriber station: segments in, filtered transcription events out.
//!
//! Runs on its own thread with a bounded input channel, so at most one
//! transcription is in flight per pipeline and segments queue up
//! first-finalized-first-invoked while one is running.

use crate::events::PipelineEvent;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::Segment;
use crate::stt::transcriber::Transcriber;
use std::path::PathBuf;
use std::sync::Arc;

/// Strips non-speech annotations in any language.
///
/// Speech models wrap annotations in `[…]`, `*…*`, or `(…)` — these never
/// contain real speech. Unmatched opening delimiters are kept as-is.
fn clean_transcription(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '[' | '(' | '*' => {
                let close = match ch {
                    '[' => ']',
                    '(' => ')',
                    '*' => '*',
                    _ => unreachable!(),
                };
                chars.next(); // consume opener
                let mut buf = String::new();
                let mut found_close = false;
                while let Some(&inner) = chars.peek() {
                    if inner == close {
                        chars.next(); // consume closer
                        found_close = true;
                        break;
                    }
                    buf.push(inner);
                    chars.next();
                }
                if !found_close {
                    // Unmatched opener — keep original characters
                    result.push(ch);
                    result.push_str(&buf);
                }
            }
            _ => {
                result.push(ch);
                chars.next();
            }
        }
    }

    // Collapse multiple spaces into one, then trim
    let mut prev_space = false;
    let collapsed: String = result
        .chars()
        .filter(|&c| {
            if c == ' ' {
                if prev_space {
                    return false;
                }
                prev_space = true;
            } else {
                prev_space = false;
            }
            true
        })
        .collect();
    collapsed.trim().to_string()
}

/// Case-insensitive, whitespace-trimmed normalization used by the
/// stop-phrase and duplicate filters.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Station that transcribes finalized segments and filters the output.
///
/// Filters run in order: empty result, stop phrase, duplicate of the
/// previously accepted result. Only a transcript surviving all three is
/// emitted, and only then does it become the new "previous" for
/// de-duplication.
pub struct TranscriberStation {
    transcriber: Arc<dyn Transcriber>,
    language: String,
    /// Stop phrases, pre-normalized for O(1)-ish comparison per segment.
    stop_phrases: Vec<String>,
    /// Normalized form of the last accepted transcript.
    last_accepted: Option<String>,
    /// Optional debug dump of each segment's audio before transcription.
    segment_dump: Option<PathBuf>,
}

impl TranscriberStation {
    /// Creates a transcriber station with the given language hint.
    pub fn new(transcriber: Arc<dyn Transcriber>, language: &str) -> Self {
        Self {
            transcriber,
            language: language.to_string(),
            stop_phrases: Vec::new(),
            last_accepted: None,
            segment_dump: None,
        }
    }

    /// Sets the stop-phrase list (normalized on the way in).
    pub fn with_stop_phrases(mut self, phrases: Vec<String>) -> Self {
        self.stop_phrases = phrases.iter().map(|p| normalize(p)).collect();
        self
    }

    /// Writes each segment's audio to this WAV path before transcribing.
    pub fn with_segment_dump(mut self, path: Option<PathBuf>) -> Self {
        self.segment_dump = path;
        self
    }
}

impl Station for TranscriberStation {
    type Input = Segment;
    type Output = PipelineEvent;

    fn name(&self) -> &'static str {
        "transcriber"
    }

    fn process(&mut self, segment: Segment) -> Result<Option<PipelineEvent>, StationError> {
        if let Some(path) = &self.segment_dump
            && let Err(e) = crate::audio::wav::write_wav(path, &segment.samples, 16_000)
        {
            // Debug dump failure must not cost us the transcript.
            eprintln!("voxgate: segment dump failed: {}", e);
        }

        let raw = self
            .transcriber
            .transcribe(&segment.samples, &self.language)
            .map_err(|e| StationError::Recoverable(format!("Transcription failed: {}", e)))?;

        let cleaned = clean_transcription(&raw);
        if cleaned.is_empty() {
            return Ok(None);
        }

        let normalized = normalize(&cleaned);
        if self.stop_phrases.iter().any(|p| p == &normalized) {
            return Ok(None);
        }

        if self.last_accepted.as_deref() == Some(normalized.as_str()) {
            return Ok(None);
        }

        self.last_accepted = Some(normalized);
        Ok(Some(PipelineEvent::Transcription { text: cleaned }))
    }
}
