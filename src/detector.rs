//! Speech segmentation state machine.
//!
//! Consumes fixed-size audio frames annotated with a speech probability and
//! accumulates complete utterances. Segment boundaries use hysteresis: speech
//! starts on the first frame at or above the threshold, and ends only after
//! the accumulated run of sub-threshold audio exceeds the silence timeout.
//! Finished segments carry pre-roll (audio retained from before onset) and
//! post-roll (lookahead audio past the cutoff) so utterances are not clipped.

use crate::defaults;
use std::collections::VecDeque;

/// Configuration for the speech detector.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Probability at or above which a frame counts as speech (0.0 to 1.0).
    pub speech_threshold: f32,
    /// Accumulated sub-threshold audio required to finalize a segment (ms).
    pub silence_timeout_ms: u32,
    /// Audio retained from before speech onset (ms).
    pub pre_roll_ms: u32,
    /// Lookahead audio appended at finalization (ms).
    pub post_roll_ms: u32,
    /// Sample rate used to convert the durations above into sample counts.
    pub sample_rate: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            speech_threshold: defaults::SPEECH_THRESHOLD,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
            pre_roll_ms: defaults::PRE_ROLL_MS,
            post_roll_ms: defaults::POST_ROLL_MS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Current state of the speech detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No recent speech; only the pre-roll lookback is retained.
    Idle,
    /// Speech detected; frames are accumulating into the segment buffer.
    Speaking,
    /// Speech previously detected; counting sub-threshold audio toward the
    /// silence timeout.
    TrailingSilence,
}

/// Speech detector state machine.
///
/// Frames must be fed one at a time, in capture order. The segment buffer is
/// non-empty exactly when the state is not `Idle`.
pub struct SpeechDetector {
    config: DetectorConfig,
    state: DetectorState,
    /// Most recent samples seen while idle, capped at the pre-roll length.
    lookback: VecDeque<f32>,
    /// Samples of the utterance currently being accumulated.
    segment: Vec<f32>,
    /// Consecutive sub-threshold samples since the last speech frame.
    silent_samples: usize,
    pre_roll_samples: usize,
    post_roll_samples: usize,
    silence_timeout_samples: usize,
}

impl SpeechDetector {
    /// Creates a new detector in the `Idle` state.
    pub fn new(config: DetectorConfig) -> Self {
        let pre_roll_samples = defaults::ms_to_samples(config.pre_roll_ms, config.sample_rate);
        let post_roll_samples = defaults::ms_to_samples(config.post_roll_ms, config.sample_rate);
        let silence_timeout_samples =
            defaults::ms_to_samples(config.silence_timeout_ms, config.sample_rate);
        Self {
            config,
            state: DetectorState::Idle,
            lookback: VecDeque::with_capacity(pre_roll_samples),
            segment: Vec::new(),
            silent_samples: 0,
            pre_roll_samples,
            post_roll_samples,
            silence_timeout_samples,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Returns the number of samples in the segment buffer.
    pub fn buffered_samples(&self) -> usize {
        self.segment.len()
    }

    /// Returns the number of lookahead samples appended at finalization.
    pub fn post_roll_samples(&self) -> usize {
        self.post_roll_samples
    }

    /// Advances the state machine by one frame.
    ///
    /// `probability` is the frame's speech score; `lookahead` is pending
    /// audio beyond this frame (typically what the frame queue still holds),
    /// used as the post-roll window when the frame finalizes a segment. Only
    /// up to the configured post-roll length is taken from it.
    ///
    /// Returns the completed segment's samples when this frame pushes the
    /// silence run past the timeout, `None` otherwise.
    pub fn step(&mut self, frame: &[f32], probability: f32, lookahead: &[f32]) -> Option<Vec<f32>> {
        let is_speech = probability >= self.config.speech_threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.segment = Vec::with_capacity(self.lookback.len() + frame.len());
                    self.segment.extend(self.lookback.drain(..));
                    self.segment.extend_from_slice(frame);
                    self.silent_samples = 0;
                    self.state = DetectorState::Speaking;
                } else {
                    self.retain_lookback(frame);
                }
                None
            }
            DetectorState::Speaking | DetectorState::TrailingSilence => {
                if is_speech {
                    self.segment.extend_from_slice(frame);
                    self.silent_samples = 0;
                    self.state = DetectorState::Speaking;
                    return None;
                }

                self.silent_samples += frame.len();
                if self.silent_samples > self.silence_timeout_samples {
                    // The frame that breaches the timeout is not part of the
                    // utterance; the post-roll lookahead stands in for it.
                    let mut finished = std::mem::take(&mut self.segment);
                    let take = lookahead.len().min(self.post_roll_samples);
                    finished.extend_from_slice(&lookahead[..take]);
                    self.reset();
                    Some(finished)
                } else {
                    self.segment.extend_from_slice(frame);
                    self.state = DetectorState::TrailingSilence;
                    None
                }
            }
        }
    }

    /// Returns to `Idle`, clearing the segment buffer, the silence counter,
    /// and the pre-roll lookback.
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.segment.clear();
        self.silent_samples = 0;
        self.lookback.clear();
    }

    /// Appends idle audio to the lookback ring, discarding the oldest samples
    /// beyond the pre-roll length.
    fn retain_lookback(&mut self, frame: &[f32]) {
        if self.pre_roll_samples == 0 {
            return;
        }
        self.lookback.extend(frame.iter().copied());
        while self.lookback.len() > self.pre_roll_samples {
            self.lookback.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: usize = 512;

    fn test_config() -> DetectorConfig {
        DetectorConfig {
            speech_threshold: 0.3,
            silence_timeout_ms: 100, // 1600 samples at 16kHz
            pre_roll_ms: 500,        // 8000 samples
            post_roll_ms: 500,       // 8000 samples
            sample_rate: 16_000,
        }
    }

    fn frame_of(value: f32) -> Vec<f32> {
        vec![value; FRAME]
    }

    fn assert_buffer_invariant(detector: &SpeechDetector) {
        let idle = detector.state() == DetectorState::Idle;
        let empty = detector.buffered_samples() == 0;
        assert_eq!(
            idle, empty,
            "segment buffer must be non-empty exactly when not idle \
             (state {:?}, buffered {})",
            detector.state(),
            detector.buffered_samples()
        );
    }

    #[test]
    fn starts_idle_with_empty_buffer() {
        let detector = SpeechDetector::new(test_config());
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.buffered_samples(), 0);
    }

    #[test]
    fn stays_idle_on_silence() {
        let mut detector = SpeechDetector::new(test_config());
        for _ in 0..10 {
            let out = detector.step(&frame_of(0.0), 0.1, &[]);
            assert!(out.is_none());
            assert_eq!(detector.state(), DetectorState::Idle);
            assert_buffer_invariant(&detector);
        }
    }

    #[test]
    fn onset_seeds_buffer_with_lookback() {
        let mut detector = SpeechDetector::new(test_config());

        // 20 idle frames = 10240 samples; lookback caps at 8000.
        for _ in 0..20 {
            detector.step(&frame_of(0.1), 0.1, &[]);
        }

        let out = detector.step(&frame_of(0.5), 0.9, &[]);
        assert!(out.is_none());
        assert_eq!(detector.state(), DetectorState::Speaking);
        assert_eq!(detector.buffered_samples(), 8000 + FRAME);
    }

    #[test]
    fn short_pre_roll_at_startup_is_accepted() {
        let mut detector = SpeechDetector::new(test_config());

        // Only 2 idle frames available before onset.
        detector.step(&frame_of(0.0), 0.1, &[]);
        detector.step(&frame_of(0.0), 0.1, &[]);

        detector.step(&frame_of(0.5), 0.9, &[]);
        assert_eq!(detector.state(), DetectorState::Speaking);
        assert_eq!(detector.buffered_samples(), 2 * FRAME + FRAME);
    }

    #[test]
    fn onset_with_no_history_buffers_only_the_frame() {
        let mut detector = SpeechDetector::new(test_config());
        detector.step(&frame_of(0.5), 0.9, &[]);
        assert_eq!(detector.state(), DetectorState::Speaking);
        assert_eq!(detector.buffered_samples(), FRAME);
        assert_buffer_invariant(&detector);
    }

    #[test]
    fn sustained_speech_grows_buffer_without_finalizing() {
        let mut detector = SpeechDetector::new(test_config());

        for i in 0..50 {
            let out = detector.step(&frame_of(0.5), 0.8, &[]);
            assert!(out.is_none(), "no finalize during sustained speech");
            assert_eq!(detector.buffered_samples(), (i + 1) * FRAME);
            assert_buffer_invariant(&detector);
        }
        assert_eq!(detector.state(), DetectorState::Speaking);
    }

    #[test]
    fn brief_dip_does_not_fragment_segment() {
        let mut detector = SpeechDetector::new(test_config());

        detector.step(&frame_of(0.5), 0.9, &[]);
        // 2 quiet frames = 1024 samples, below the 1600-sample timeout.
        detector.step(&frame_of(0.0), 0.1, &[]);
        assert_eq!(detector.state(), DetectorState::TrailingSilence);
        detector.step(&frame_of(0.0), 0.1, &[]);
        assert_eq!(detector.state(), DetectorState::TrailingSilence);

        // Speech resumes: counter resets, same segment continues.
        let out = detector.step(&frame_of(0.5), 0.9, &[]);
        assert!(out.is_none());
        assert_eq!(detector.state(), DetectorState::Speaking);
        assert_eq!(detector.buffered_samples(), 4 * FRAME);
    }

    #[test]
    fn silence_past_timeout_finalizes_once_and_resets() {
        let mut detector = SpeechDetector::new(test_config());

        detector.step(&frame_of(0.5), 0.9, &[]);
        // Frames 1-3 of silence: 512, 1024, 1536 — all within timeout.
        for _ in 0..3 {
            let out = detector.step(&frame_of(0.0), 0.1, &[]);
            assert!(out.is_none());
            assert_buffer_invariant(&detector);
        }
        // Frame 4: counter reaches 2048 > 1600 — finalize.
        let out = detector.step(&frame_of(0.0), 0.1, &[]);
        let segment = out.expect("should finalize");
        // 1 speech frame + 3 trailing frames; the finalizing frame is excluded.
        assert_eq!(segment.len(), 4 * FRAME);
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.buffered_samples(), 0);
        assert_buffer_invariant(&detector);
    }

    #[test]
    fn reference_frame_sequence() {
        // 16kHz, 512-sample frames, threshold 0.3, timeout 100ms (1600
        // samples, i.e. 4 frames): 13 speech frames then 5 silent frames.
        let mut detector = SpeechDetector::new(test_config());

        // Frames 1-13 at probability 0.5: onset on frame 1, grows each step.
        for i in 0..13 {
            let out = detector.step(&frame_of(0.5), 0.5, &[]);
            assert!(out.is_none());
            assert_eq!(detector.buffered_samples(), (i + 1) * FRAME);
        }
        assert_eq!(detector.state(), DetectorState::Speaking);

        // Frames 14-16 at probability 0.1: trailing silence, still growing.
        let lookahead = vec![0.25f32; 9000];
        for i in 0..3 {
            let out = detector.step(&frame_of(0.0), 0.1, &lookahead);
            assert!(out.is_none());
            assert_eq!(detector.state(), DetectorState::TrailingSilence);
            assert_eq!(detector.buffered_samples(), (14 + i) * FRAME);
        }

        // Frame 17: fourth consecutive sub-threshold frame finalizes.
        let out = detector.step(&frame_of(0.0), 0.1, &lookahead);
        let segment = out.expect("fourth silent frame should finalize");
        // 16 data frames plus the 8000-sample post-roll window (pre-roll was
        // empty — onset was the first frame fed).
        assert_eq!(segment.len(), 16 * FRAME + 8000);
        assert_eq!(detector.state(), DetectorState::Idle);

        // Frame 18: back to plain idle silence.
        let out = detector.step(&frame_of(0.0), 0.1, &[]);
        assert!(out.is_none());
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn post_roll_is_capped_at_configured_length() {
        let mut detector = SpeechDetector::new(test_config());

        detector.step(&frame_of(0.5), 0.9, &[]);
        let lookahead = vec![0.5f32; 20_000];
        for _ in 0..3 {
            detector.step(&frame_of(0.0), 0.1, &lookahead);
        }
        let segment = detector
            .step(&frame_of(0.0), 0.1, &lookahead)
            .expect("should finalize");
        assert_eq!(segment.len(), 4 * FRAME + 8000);
    }

    #[test]
    fn short_post_roll_when_little_lookahead_available() {
        let mut detector = SpeechDetector::new(test_config());

        detector.step(&frame_of(0.5), 0.9, &[]);
        for _ in 0..3 {
            detector.step(&frame_of(0.0), 0.1, &[]);
        }
        let lookahead = vec![0.0f32; 100];
        let segment = detector
            .step(&frame_of(0.0), 0.1, &lookahead)
            .expect("should finalize");
        assert_eq!(segment.len(), 4 * FRAME + 100);
    }

    #[test]
    fn segment_preserves_sample_order() {
        let config = DetectorConfig {
            pre_roll_ms: 32, // exactly one frame
            ..test_config()
        };
        let mut detector = SpeechDetector::new(config);

        let idle: Vec<f32> = (0..FRAME).map(|i| i as f32).collect();
        detector.step(&idle, 0.1, &[]);

        let speech: Vec<f32> = (0..FRAME).map(|i| (FRAME + i) as f32).collect();
        detector.step(&speech, 0.9, &[]);

        for _ in 0..3 {
            detector.step(&frame_of(-1.0), 0.1, &[]);
        }
        let segment = detector
            .step(&frame_of(-1.0), 0.1, &[])
            .expect("should finalize");

        // Pre-roll first, then the onset frame, then trailing frames.
        assert_eq!(segment[0], 0.0);
        assert_eq!(segment[FRAME - 1], (FRAME - 1) as f32);
        assert_eq!(segment[FRAME], FRAME as f32);
        assert_eq!(segment[2 * FRAME - 1], (2 * FRAME - 1) as f32);
        assert_eq!(segment[2 * FRAME], -1.0);
    }

    #[test]
    fn lookback_does_not_survive_finalization() {
        let mut detector = SpeechDetector::new(test_config());

        // First utterance.
        for _ in 0..5 {
            detector.step(&frame_of(0.7), 0.1, &[]);
        }
        detector.step(&frame_of(0.5), 0.9, &[]);
        for _ in 0..4 {
            detector.step(&frame_of(0.0), 0.1, &[]);
        }
        assert_eq!(detector.state(), DetectorState::Idle);

        // Immediately after finalization the lookback is empty, so a new
        // onset seeds only the current frame.
        detector.step(&frame_of(0.5), 0.9, &[]);
        assert_eq!(detector.buffered_samples(), FRAME);
    }

    #[test]
    fn two_utterances_produce_two_segments() {
        let mut detector = SpeechDetector::new(test_config());

        let mut segments = Vec::new();
        for _ in 0..2 {
            detector.step(&frame_of(0.5), 0.9, &[]);
            detector.step(&frame_of(0.5), 0.9, &[]);
            for _ in 0..4 {
                if let Some(s) = detector.step(&frame_of(0.0), 0.1, &[]) {
                    segments.push(s);
                }
            }
            assert_eq!(detector.state(), DetectorState::Idle);
        }
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 5 * FRAME);
        assert_eq!(segments[1].len(), 5 * FRAME);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut detector = SpeechDetector::new(test_config());
        detector.step(&frame_of(0.5), 0.3, &[]);
        assert_eq!(detector.state(), DetectorState::Speaking);
    }

    #[test]
    fn zero_pre_roll_skips_lookback() {
        let config = DetectorConfig {
            pre_roll_ms: 0,
            ..test_config()
        };
        let mut detector = SpeechDetector::new(config);

        for _ in 0..5 {
            detector.step(&frame_of(0.7), 0.1, &[]);
        }
        detector.step(&frame_of(0.5), 0.9, &[]);
        assert_eq!(detector.buffered_samples(), FRAME);
    }

    #[test]
    fn reset_returns_to_idle_from_any_state() {
        let mut detector = SpeechDetector::new(test_config());

        detector.step(&frame_of(0.5), 0.9, &[]);
        assert_eq!(detector.state(), DetectorState::Speaking);
        detector.reset();
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.buffered_samples(), 0);

        detector.step(&frame_of(0.5), 0.9, &[]);
        detector.step(&frame_of(0.0), 0.1, &[]);
        assert_eq!(detector.state(), DetectorState::TrailingSilence);
        detector.reset();
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.buffered_samples(), 0);
    }

    #[test]
    fn invariant_holds_across_random_walk() {
        let mut detector = SpeechDetector::new(test_config());

        // Deterministic pseudo-random probability sequence.
        let mut seed: u32 = 0x2545_F491;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let probability = (seed >> 8) as f32 / (u32::MAX >> 8) as f32;
            detector.step(&frame_of(0.1), probability, &[]);
            assert_buffer_invariant(&detector);
        }
    }
}
