//! Pipeline assembly: capture thread, stations, and lifecycle control.
//!
//! Two execution contexts meet here. The capture thread polls the frame
//! source at its own cadence and only ever pushes batches into a bounded
//! channel — it never waits on scoring, transcription, or delivery. The
//! station threads form the dispatch side: detector → transcriber →
//! broadcast, connected by bounded channels. Shutdown is ordered by channel
//! closure: the capture thread stops the source and hangs up first, then
//! each station drains and exits in turn.

use crate::audio::source::FrameSource;
use crate::broadcast::BroadcastHub;
use crate::defaults;
use crate::detector::DetectorConfig;
use crate::error::Result;
use crate::events::PipelineEvent;
use crate::pipeline::broadcast_station::BroadcastStation;
use crate::pipeline::detector_station::DetectorStation;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::station::StationRunner;
use crate::pipeline::transcriber_station::TranscriberStation;
use crate::pipeline::types::AudioBatch;
use crate::scorer::SpeechScorer;
use crate::stt::transcriber::Transcriber;
use crossbeam_channel::bounded;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Segmentation configuration.
    pub detector: DetectorConfig,
    /// Analysis frame length in samples.
    pub frame_samples: usize,
    /// Language hint passed to the transcriber.
    pub language: String,
    /// Stop phrases filtered from transcription output.
    pub stop_phrases: Vec<String>,
    /// Optional WAV path each finalized segment is dumped to.
    pub segment_dump_path: Option<PathBuf>,
    /// Suppress operational stderr messages.
    pub quiet: bool,
    /// Channel buffer sizes.
    pub audio_buffer: usize,
    pub segment_buffer: usize,
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            frame_samples: defaults::FRAME_SAMPLES,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            stop_phrases: defaults::default_stop_phrases(),
            segment_dump_path: None,
            quiet: false,
            audio_buffer: 1024,
            segment_buffer: 16,
            event_buffer: 1024,
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    /// Flag signaling shutdown; also gates broadcast delivery.
    running: Arc<AtomicBool>,
    /// Join handles for spawned threads.
    threads: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Stops the pipeline gracefully.
    ///
    /// Signals shutdown, then waits up to 5s for threads to finish — enough
    /// for an in-flight transcription to complete (its result is discarded
    /// by the broadcast gate). Remaining threads are detached after the
    /// deadline and die with the process.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);

        let deadline = Instant::now() + Duration::from_secs(5);
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("voxgate: pipeline thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "voxgate: shutdown timeout — {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }
    }

    /// Returns true if the pipeline has not been told to stop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Audio pipeline: FrameSource → detector → transcriber → broadcast hub.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with the default stderr error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the pipeline.
    ///
    /// # Arguments
    /// * `frame_source` - Audio capture source; a start failure here (device
    ///   missing, permission denied) aborts pipeline startup.
    /// * `scorer` - Per-frame speech scoring capability
    /// * `transcriber` - Segment transcription capability
    /// * `hub` - Broadcast hub events are delivered through
    pub fn start(
        self,
        mut frame_source: Box<dyn FrameSource>,
        scorer: Arc<dyn SpeechScorer>,
        transcriber: Arc<dyn Transcriber>,
        hub: Arc<BroadcastHub>,
    ) -> Result<PipelineHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let sequence = Arc::new(AtomicU64::new(0));
        let quiet = self.config.quiet;

        // Channels between stations
        let (audio_tx, audio_rx) = bounded(self.config.audio_buffer);
        let (segment_tx, segment_rx) = bounded(self.config.segment_buffer);
        let (event_tx, event_rx) = bounded::<PipelineEvent>(self.config.event_buffer);

        // Stations
        let detector_station = DetectorStation::new(
            self.config.detector,
            self.config.frame_samples,
            scorer,
        )
        .with_event_tx(event_tx.clone())
        .with_flush_tx(segment_tx.clone())
        .with_reporter(self.error_reporter.clone());

        let transcriber_station = TranscriberStation::new(transcriber, &self.config.language)
            .with_stop_phrases(self.config.stop_phrases.clone())
            .with_segment_dump(self.config.segment_dump_path.clone());

        let broadcast_station = BroadcastStation::new(hub, running.clone());

        // Station runners. Channel ownership after these spawns: the
        // detector thread holds the only senders into the segment channel,
        // and the detector + transcriber threads the only senders into the
        // event channel — so each closes exactly when its producers exit.
        let detector_runner = StationRunner::spawn(
            detector_station,
            audio_rx,
            segment_tx,
            self.error_reporter.clone(),
        );

        let transcriber_runner = StationRunner::spawn(
            transcriber_station,
            segment_rx,
            event_tx,
            self.error_reporter.clone(),
        );

        // The broadcast station never emits output; its output channel is a
        // stub that is dropped immediately.
        let (sink_tx, _sink_rx) = bounded::<()>(1);
        let broadcast_runner = StationRunner::spawn(
            broadcast_station,
            event_rx,
            sink_tx,
            self.error_reporter.clone(),
        );

        // Start audio capture before spawning the polling thread — a device
        // fault surfaces here as a start failure.
        frame_source.start()?;

        let source_is_finite = frame_source.is_finite();

        // Capture polling thread (producer execution context)
        let audio_running = running.clone();
        let audio_sequence = sequence.clone();
        let audio_handle = thread::spawn(move || {
            // Poll the source at ~60Hz (every 16ms)
            let poll_interval = Duration::from_millis(16);

            let mut consecutive_errors: u32 = 0;
            const MAX_CONSECUTIVE_ERRORS: u32 = 10;
            let mut batches_sent: u64 = 0;

            while audio_running.load(Ordering::SeqCst) {
                let samples = match frame_source.read_samples() {
                    Ok(s) => {
                        consecutive_errors = 0;
                        s
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            if !quiet {
                                eprintln!(
                                    "voxgate: audio capture failed {consecutive_errors} times in a row: {e}"
                                );
                                eprintln!(
                                    "voxgate: check your microphone connection and try again"
                                );
                            }
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                if samples.is_empty() {
                    if source_is_finite {
                        // File/pipe source exhausted — exit polling loop.
                        break;
                    }
                    // Live source: empty reads are normal while the device
                    // warms up. Keep polling.
                    thread::sleep(poll_interval);
                    continue;
                }

                let batch = AudioBatch::new(
                    samples,
                    Instant::now(),
                    audio_sequence.fetch_add(1, Ordering::Relaxed),
                );

                // Try to send - if the channel is full, drop the batch
                if audio_tx.try_send(batch).is_err() {
                    if !audio_running.load(Ordering::SeqCst) {
                        break;
                    }
                } else {
                    batches_sent += 1;
                }

                thread::sleep(poll_interval);
            }

            if batches_sent == 0 && !source_is_finite && !quiet {
                eprintln!("voxgate: no audio captured from the input device");
                eprintln!("  - Check that your microphone is connected and selected");
                eprintln!("  - Run: voxgate devices");
            }

            if let Err(e) = frame_source.stop() {
                eprintln!("voxgate: failed to stop audio capture: {e}");
            }
        });

        // Collect thread handles; runner joins are wrapped so panics are
        // reported instead of silently swallowed.
        let mut threads = vec![audio_handle];
        threads.push(thread::spawn(move || {
            if let Err(msg) = detector_runner.join() {
                eprintln!("voxgate: {msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = transcriber_runner.join() {
                eprintln!("voxgate: {msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = broadcast_runner.join() {
                eprintln!("voxgate: {msg}");
            }
        }));

        Ok(PipelineHandle { running, threads })
    }
}

/// Factory producing a fresh frame source for each pipeline run.
pub type SourceFactory = Box<dyn Fn() -> Result<Box<dyn FrameSource>> + Send + Sync>;

/// Idempotent start/stop surface around the pipeline.
///
/// Hosts hold one controller for the lifetime of the service: `start` while
/// running and `stop` while stopped are no-ops, and the broadcast hub stays
/// valid across restarts so subscribers registered once keep receiving
/// events from every run.
pub struct PipelineController {
    config: PipelineConfig,
    source_factory: SourceFactory,
    scorer: Arc<dyn SpeechScorer>,
    transcriber: Arc<dyn Transcriber>,
    hub: Arc<BroadcastHub>,
    error_reporter: Arc<dyn ErrorReporter>,
    handle: Mutex<Option<PipelineHandle>>,
}

impl PipelineController {
    /// Creates a controller with a fresh broadcast hub.
    pub fn new(
        config: PipelineConfig,
        source_factory: SourceFactory,
        scorer: Arc<dyn SpeechScorer>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            source_factory,
            scorer,
            transcriber,
            hub: Arc::new(BroadcastHub::new()),
            error_reporter: Arc::new(LogReporter),
            handle: Mutex::new(None),
        }
    }

    /// Sets a custom error reporter for subsequent runs.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// The hub subscribers register against.
    pub fn hub(&self) -> Arc<BroadcastHub> {
        self.hub.clone()
    }

    /// Starts capture and processing. A no-op when already running.
    pub fn start(&self) -> Result<()> {
        let mut guard = match self.handle.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.as_ref().is_some_and(|h| h.is_running()) {
            return Ok(());
        }
        // A handle that is present but no longer running was stopped
        // internally (e.g. finite source drained); replace it.
        if let Some(stale) = guard.take() {
            stale.stop();
        }

        let source = (self.source_factory)()?;
        let pipeline = Pipeline::new(self.config.clone())
            .with_error_reporter(self.error_reporter.clone());
        let handle = pipeline.start(
            source,
            self.scorer.clone(),
            self.transcriber.clone(),
            self.hub.clone(),
        )?;
        *guard = Some(handle);
        Ok(())
    }

    /// Stops capture and processing. A no-op when not running.
    pub fn stop(&self) {
        let handle = {
            let mut guard = match self.handle.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    /// Whether a pipeline run is currently active.
    pub fn is_running(&self) -> bool {
        match self.handle.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|h| h.is_running()),
            Err(_) => false,
        }
    }
}
