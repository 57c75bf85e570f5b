//! Speech scoring for audio frames.
//!
//! A scorer rates a single fixed-size frame's likelihood of containing
//! speech. The trait keeps the acoustic model pluggable: hosts inject their
//! own model-backed scorer, while `EnergyScorer` provides a dependency-free
//! RMS-based implementation good enough for level-gated use.

use crate::error::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait for per-frame speech scoring.
///
/// Implementations must be cheap enough to call once per frame (every 32ms
/// at the default configuration) without falling behind capture.
pub trait SpeechScorer: Send + Sync {
    /// Score one frame of mono f32 samples.
    ///
    /// # Returns
    /// Speech probability in [0.0, 1.0], or an error if the underlying model
    /// failed. Callers treat a failed score as silence.
    fn score(&self, frame: &[f32]) -> Result<f32>;

    /// Name for logging/debugging.
    fn name(&self) -> &str {
        "scorer"
    }
}

/// RMS-energy-based scorer.
///
/// Maps the frame's root-mean-square amplitude onto [0.0, 1.0] relative to a
/// reference level: a frame at or above the reference scores 1.0, silence
/// scores 0.0. Not a real voice activity model — it cannot tell speech from
/// any other sound — but deterministic and useful as a default.
#[derive(Debug, Clone, Copy)]
pub struct EnergyScorer {
    /// RMS amplitude that maps to probability 1.0.
    reference_rms: f32,
}

impl EnergyScorer {
    /// Creates an energy scorer with the given full-scale reference RMS.
    pub fn new(reference_rms: f32) -> Self {
        Self {
            reference_rms: reference_rms.max(f32::EPSILON),
        }
    }
}

impl Default for EnergyScorer {
    fn default() -> Self {
        // 0.1 RMS on normalized samples is comfortably within typical
        // microphone speech levels.
        Self::new(0.1)
    }
}

impl SpeechScorer for EnergyScorer {
    fn score(&self, frame: &[f32]) -> Result<f32> {
        let rms = calculate_rms(frame);
        Ok((rms / self.reference_rms).clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "energy"
    }
}

/// Calculates the root mean square of normalized f32 samples.
///
/// Returns a value in [0.0, 1.0] for samples within [-1.0, 1.0]; a
/// full-scale sine wave yields ~0.707.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Mock scorer for testing.
///
/// Replays a scripted sequence of scores, then repeats the last one. Can be
/// configured to fail on every call.
pub struct MockScorer {
    scores: Mutex<VecDeque<f32>>,
    last: Mutex<f32>,
    should_fail: bool,
}

impl MockScorer {
    /// Creates a mock that always returns `score`.
    pub fn constant(score: f32) -> Self {
        Self {
            scores: Mutex::new(VecDeque::new()),
            last: Mutex::new(score),
            should_fail: false,
        }
    }

    /// Creates a mock that replays `scores` in order, then repeats the last.
    pub fn sequence(scores: &[f32]) -> Self {
        let last = scores.last().copied().unwrap_or(0.0);
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            last: Mutex::new(last),
            should_fail: false,
        }
    }

    /// Configures the mock to fail on every call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl SpeechScorer for MockScorer {
    fn score(&self, _frame: &[f32]) -> Result<f32> {
        if self.should_fail {
            return Err(crate::error::VoxgateError::Scoring {
                message: "mock scoring failure".to_string(),
            });
        }
        if let Ok(mut scores) = self.scores.lock()
            && let Some(next) = scores.pop_front()
        {
            if let Ok(mut last) = self.last.lock() {
                *last = next;
            }
            return Ok(next);
        }
        Ok(self.last.lock().map(|l| *l).unwrap_or(0.0))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(calculate_rms(&vec![0.0; 512]), 0.0);
    }

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_dc_is_one() {
        let rms = calculate_rms(&vec![1.0; 512]);
        assert!((rms - 1.0).abs() < 1e-6, "got {}", rms);
    }

    #[test]
    fn rms_ignores_sign() {
        let positive = calculate_rms(&vec![0.5; 512]);
        let negative = calculate_rms(&vec![-0.5; 512]);
        assert!((positive - negative).abs() < 1e-6);
    }

    #[test]
    fn energy_scorer_silence_scores_zero() {
        let scorer = EnergyScorer::default();
        let score = scorer.score(&vec![0.0; 512]).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn energy_scorer_loud_frame_saturates_at_one() {
        let scorer = EnergyScorer::default();
        let score = scorer.score(&vec![0.9; 512]).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn energy_scorer_scales_against_reference() {
        let scorer = EnergyScorer::new(0.2);
        let score = scorer.score(&vec![0.1; 512]).unwrap();
        assert!((score - 0.5).abs() < 1e-5, "got {}", score);
    }

    #[test]
    fn mock_scorer_replays_sequence_then_repeats_last() {
        let scorer = MockScorer::sequence(&[0.1, 0.9, 0.5]);
        let frame = vec![0.0; 512];
        assert_eq!(scorer.score(&frame).unwrap(), 0.1);
        assert_eq!(scorer.score(&frame).unwrap(), 0.9);
        assert_eq!(scorer.score(&frame).unwrap(), 0.5);
        assert_eq!(scorer.score(&frame).unwrap(), 0.5);
    }

    #[test]
    fn mock_scorer_constant() {
        let scorer = MockScorer::constant(0.7);
        let frame = vec![0.0; 512];
        assert_eq!(scorer.score(&frame).unwrap(), 0.7);
        assert_eq!(scorer.score(&frame).unwrap(), 0.7);
    }

    #[test]
    fn mock_scorer_failure() {
        let scorer = MockScorer::constant(0.5).with_failure();
        let result = scorer.score(&vec![0.0; 512]);
        assert!(result.is_err());
    }

    #[test]
    fn scorer_trait_is_object_safe() {
        let scorer: Box<dyn SpeechScorer> = Box::new(EnergyScorer::default());
        assert_eq!(scorer.name(), "energy");
        assert!(scorer.score(&vec![0.0; 512]).is_ok());
    }
}
