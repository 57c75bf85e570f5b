//! Data types flowing between pipeline stations.

use std::time::Instant;

/// A batch of raw samples as delivered by the capture thread.
///
/// Batch sizes are device-chosen; the detector station re-chunks them into
/// fixed analysis frames.
#[derive(Debug, Clone)]
pub struct AudioBatch {
    /// Mono f32 samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Timestamp when this batch was read from the source.
    pub timestamp: Instant,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
}

impl AudioBatch {
    /// Creates a new audio batch.
    pub fn new(samples: Vec<f32>, timestamp: Instant, sequence: u64) -> Self {
        Self {
            samples,
            timestamp,
            sequence,
        }
    }
}

/// One finalized speech segment, ready for transcription.
///
/// Contains pre-roll, the detected utterance, and post-roll, in capture
/// order.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Mono f32 samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Duration of the segment in milliseconds.
    pub duration_ms: u32,
    /// Sequence number, incremented per finalized segment.
    pub sequence: u64,
}

impl Segment {
    /// Creates a segment, deriving the duration from the sample count.
    pub fn new(samples: Vec<f32>, sample_rate: u32, sequence: u64) -> Self {
        let duration_ms = if sample_rate == 0 {
            0
        } else {
            (samples.len() as u64 * 1000 / sample_rate as u64) as u32
        };
        Self {
            samples,
            duration_ms,
            sequence,
        }
    }
}
