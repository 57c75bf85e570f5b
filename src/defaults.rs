//! Default configuration constants for voxgate.
//!
//! Shared across configuration types so the library, CLI, and tests agree on
//! one set of tuning values.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and matches what both the
/// scorer and transcriber models expect.
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of samples in one analysis frame.
///
/// 512 samples at 16kHz is 32ms of audio, the window size the speech scorer
/// is evaluated on. Every stage downstream of the frame queue operates on
/// frames of exactly this length.
pub const FRAME_SAMPLES: usize = 512;

/// Default speech probability threshold.
///
/// Frames scoring at or above this are treated as speech. 0.3 is tuned for
/// probability-style scorers; energy-based scorers map their RMS onto the
/// same scale.
pub const SPEECH_THRESHOLD: f32 = 0.3;

/// Default silence timeout in milliseconds.
///
/// Accumulated sub-threshold audio must exceed this before a segment is
/// finalized. Acts as a debounce so a brief dip mid-sentence does not split
/// one utterance into many segments.
pub const SILENCE_TIMEOUT_MS: u32 = 100;

/// Pre-roll duration in milliseconds.
///
/// Audio retained from before detected speech onset, prepended to the
/// segment. Captures soft onsets (plosives, fricatives) that occur before
/// the scorer crosses the threshold.
pub const PRE_ROLL_MS: u32 = 500;

/// Post-roll duration in milliseconds.
///
/// Lookahead audio appended when a segment is finalized, so word endings are
/// not clipped by the silence cutoff.
pub const POST_ROLL_MS: u32 = 500;

/// Default language code passed to the transcriber.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language value that lets the transcriber auto-detect the spoken language.
pub const AUTO_LANGUAGE: &str = "auto";

/// Stop phrases dropped from transcription output.
///
/// Short fillers that speech models hallucinate on near-silent segments.
/// Compared case-insensitively after trimming.
pub fn default_stop_phrases() -> Vec<String> {
    [
        "you",
        "thank you.",
        "thanks for watching.",
        "thanks for watching!",
        "thank you for watching.",
        "okay.",
        "bye.",
        "so,",
        "i'm sorry.",
        ".",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Convert a duration in milliseconds to a sample count at the given rate.
pub const fn ms_to_samples(ms: u32, sample_rate: u32) -> usize {
    (sample_rate as u64 * ms as u64 / 1000) as usize
}
