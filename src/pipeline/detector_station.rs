//! Detector station: frames, scores, and segments raw audio batches.
//!
//! This is the pipeline's dispatch core. Each incoming batch is re-chunked
//! into fixed analysis frames; every frame is scored, its probability is
//! published on the event channel, and the segmentation state machine is
//! advanced. Frames are processed strictly in arrival order — the pre-roll,
//! post-roll, and silence counter are all defined relative to that single
//! total order.

use crate::audio::frame_queue::FrameQueue;
use crate::detector::{DetectorConfig, SpeechDetector};
use crate::events::PipelineEvent;
use crate::pipeline::error::{ErrorReporter, StationError};
use crate::pipeline::station::Station;
use crate::pipeline::types::{AudioBatch, Segment};
use crate::scorer::SpeechScorer;
use std::sync::Arc;

/// Station that turns raw audio batches into finalized speech segments.
pub struct DetectorStation {
    queue: FrameQueue,
    detector: SpeechDetector,
    scorer: Arc<dyn SpeechScorer>,
    sample_rate: u32,
    /// Side channel for per-frame probability events.
    event_tx: Option<crossbeam_channel::Sender<PipelineEvent>>,
    /// Direct output sender for additional segments when one batch
    /// finalizes more than once.
    flush_tx: Option<crossbeam_channel::Sender<Segment>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    segment_sequence: u64,
}

impl DetectorStation {
    /// Creates a detector station.
    pub fn new(
        config: DetectorConfig,
        frame_samples: usize,
        scorer: Arc<dyn SpeechScorer>,
    ) -> Self {
        Self {
            queue: FrameQueue::new(frame_samples),
            detector: SpeechDetector::new(config),
            scorer,
            sample_rate: config.sample_rate,
            event_tx: None,
            flush_tx: None,
            reporter: None,
            segment_sequence: 0,
        }
    }

    /// Sets the sender for per-frame probability events.
    pub fn with_event_tx(mut self, tx: crossbeam_channel::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Sets a direct segment sender used when a single batch finalizes more
    /// than one segment (the station's return value carries only the last).
    pub fn with_flush_tx(mut self, tx: crossbeam_channel::Sender<Segment>) -> Self {
        self.flush_tx = Some(tx);
        self
    }

    /// Sets the reporter used for per-frame scoring faults.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn score_frame(&self, frame: &[f32]) -> f32 {
        match self.scorer.score(frame) {
            Ok(p) => p.clamp(0.0, 1.0),
            Err(e) => {
                // Fail toward silence: an unscorable frame must not halt the
                // pipeline or extend a segment.
                if let Some(reporter) = &self.reporter {
                    reporter.report(
                        self.name(),
                        &StationError::Recoverable(format!("scoring failed: {}", e)),
                    );
                }
                0.0
            }
        }
    }

    fn make_segment(&mut self, samples: Vec<f32>) -> Segment {
        let sequence = self.segment_sequence;
        self.segment_sequence += 1;
        Segment::new(samples, self.sample_rate, sequence)
    }
}

impl Station for DetectorStation {
    type Input = AudioBatch;
    type Output = Segment;

    fn name(&self) -> &'static str {
        "detector"
    }

    fn process(&mut self, batch: AudioBatch) -> Result<Option<Segment>, StationError> {
        if batch.samples.is_empty() {
            return Ok(None);
        }

        self.queue.push(&batch.samples);

        let mut finalized: Option<Segment> = None;
        while let Some(frame) = self.queue.pop_frame() {
            let probability = self.score_frame(&frame);

            // Probability side channel: one event per frame, every frame.
            // A closed channel only happens during shutdown.
            if let Some(tx) = &self.event_tx {
                let _ = tx.send(PipelineEvent::Probability { probability });
            }

            let lookahead = self.queue.peek(self.detector.post_roll_samples());
            if let Some(samples) = self.detector.step(&frame, probability, &lookahead) {
                let segment = self.make_segment(samples);
                if let Some(previous) = finalized.replace(segment) {
                    match &self.flush_tx {
                        Some(tx) => {
                            if tx.send(previous).is_err() {
                                return Err(StationError::Fatal(
                                    "segment channel closed".to_string(),
                                ));
                            }
                        }
                        None => {
                            return Err(StationError::Recoverable(
                                "dropped segment: no flush channel for multi-segment batch"
                                    .to_string(),
                            ));
                        }
                    }
                }
            }
        }

        Ok(finalized)
    }
}
