//! Frame source abstraction over audio input devices.

use crate::defaults;
use crate::error::{Result, VoxgateError};
use std::sync::{Arc, Mutex};

/// Trait for raw audio sources.
///
/// A source produces batches of mono f32 samples normalized to [-1.0, 1.0]
/// at the pipeline sample rate. Batch sizes are whatever the backend
/// chooses; the frame queue downstream re-chunks them.
pub trait FrameSource: Send + Sync {
    /// Start capturing audio.
    ///
    /// A device fault here (missing device, permission denied) is fatal for
    /// pipeline startup and must be returned, not deferred.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio.
    ///
    /// After this returns no further samples are buffered, but samples
    /// already captured remain readable.
    fn stop(&mut self) -> Result<()>;

    /// Drain all samples captured since the last read.
    ///
    /// Returns an empty vector when nothing new has arrived.
    fn read_samples(&mut self) -> Result<Vec<f32>>;

    /// Whether the source runs out (file/pipe) or captures live (microphone).
    ///
    /// An empty read from a finite source means end of input; from a live
    /// source it just means no callback fired yet.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Configuration for frame source initialization.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub sample_rate: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// One phase of scripted mock output: `count` reads each returning a copy of
/// `samples`.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<f32>,
    pub count: u32,
}

/// Mock frame source for testing.
///
/// Either repeats one fixed batch forever, or plays through a scripted
/// sequence of phases and then returns empty reads.
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    is_started: bool,
    samples: Vec<f32>,
    phases: Option<Vec<FramePhase>>,
    phase_index: usize,
    phase_reads: u32,
    live: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
    reads: Arc<Mutex<u64>>,
}

impl MockFrameSource {
    /// Creates a mock returning 160 zero samples per read, forever.
    pub fn new() -> Self {
        Self {
            is_started: false,
            samples: vec![0.0; 160],
            phases: None,
            phase_index: 0,
            phase_reads: 0,
            live: false,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
            reads: Arc::new(Mutex::new(0)),
        }
    }

    /// Configures the mock to return specific samples on every read.
    pub fn with_samples(mut self, samples: Vec<f32>) -> Self {
        self.samples = samples;
        self
    }

    /// Configures the mock to play a scripted phase sequence, then return
    /// empty reads. The source reports itself finite unless `as_live_source`
    /// is also set.
    pub fn with_frame_sequence(mut self, phases: Vec<FramePhase>) -> Self {
        self.phases = Some(phases);
        self
    }

    /// Reports the source as live (empty reads do not mean exhaustion).
    pub fn as_live_source(mut self) -> Self {
        self.live = true;
        self
    }

    /// Configures the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configures the mock to fail on read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configures the error message used for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Whether the source has been started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Total number of read calls observed.
    pub fn read_count(&self) -> u64 {
        self.reads.lock().map(|r| *r).unwrap_or(0)
    }
}

impl Default for MockFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockFrameSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(VoxgateError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if let Ok(mut reads) = self.reads.lock() {
            *reads += 1;
        }
        if self.should_fail_read {
            return Err(VoxgateError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        match &self.phases {
            None => Ok(self.samples.clone()),
            Some(phases) => {
                while self.phase_index < phases.len() {
                    let phase = &phases[self.phase_index];
                    if self.phase_reads < phase.count {
                        self.phase_reads += 1;
                        return Ok(phase.samples.clone());
                    }
                    self.phase_index += 1;
                    self.phase_reads = 0;
                }
                Ok(Vec::new())
            }
        }
    }

    fn is_finite(&self) -> bool {
        self.phases.is_some() && !self.live
    }
}
