//! Re-chunking queue between device-sized batches and fixed-size frames.
//!
//! Audio devices deliver batches of whatever size the backend chooses; the
//! detector needs frames of exactly one analysis window. The queue buffers
//! incoming samples and deals them out as fixed-size frames, preserving
//! order with no duplication or loss.

use crate::defaults;
use std::collections::VecDeque;

/// Single-consumer sample accumulator that emits fixed-size frames.
pub struct FrameQueue {
    buf: VecDeque<f32>,
    frame_samples: usize,
}

impl FrameQueue {
    /// Creates a queue emitting frames of `frame_samples` samples.
    pub fn new(frame_samples: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(frame_samples * 4),
            frame_samples,
        }
    }

    /// Appends a batch of raw samples of any size.
    pub fn push(&mut self, samples: &[f32]) {
        self.buf.extend(samples.iter().copied());
    }

    /// Removes and returns the next full frame, or `None` if fewer than a
    /// frame's worth of samples remain.
    pub fn pop_frame(&mut self) -> Option<Vec<f32>> {
        if self.buf.len() < self.frame_samples {
            return None;
        }
        Some(self.buf.drain(..self.frame_samples).collect())
    }

    /// Copies up to `n` pending samples without consuming them.
    ///
    /// Used for the post-roll lookahead window: the copied samples stay in
    /// the queue and are still emitted as frames later.
    pub fn peek(&self, n: usize) -> Vec<f32> {
        self.buf.iter().take(n).copied().collect()
    }

    /// Number of samples currently buffered.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Discards all buffered samples.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new(defaults::FRAME_SAMPLES)
    }
}
