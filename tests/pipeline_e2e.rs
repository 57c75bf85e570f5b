//! End-to-end pipeline tests through the public API: scripted audio source
//! → detector → transcriber → broadcast hub → subscribers.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use voxgate::audio::source::{FramePhase, MockFrameSource};
use voxgate::broadcast::{BroadcastHub, CollectorSubscriber, Subscriber};
use voxgate::detector::DetectorConfig;
use voxgate::events::PipelineEvent;
use voxgate::pipeline::{Pipeline, PipelineConfig};
use voxgate::scorer::EnergyScorer;
use voxgate::stt::transcriber::MockTranscriber;
use voxgate::{Result, VoxgateError};

const FRAME: usize = 512;

fn e2e_config() -> PipelineConfig {
    PipelineConfig {
        detector: DetectorConfig {
            speech_threshold: 0.3,
            silence_timeout_ms: 100,
            pre_roll_ms: 100,
            post_roll_ms: 100,
            sample_rate: 16_000,
        },
        quiet: true,
        stop_phrases: vec!["thank you.".to_string()],
        ..Default::default()
    }
}

fn loud(count: u32) -> FramePhase {
    FramePhase {
        samples: vec![0.5; FRAME],
        count,
    }
}

fn silent(count: u32) -> FramePhase {
    FramePhase {
        samples: vec![0.0; FRAME],
        count,
    }
}

/// One utterance: onset, sustained speech, silence past the timeout.
fn one_utterance() -> Vec<FramePhase> {
    vec![loud(6), silent(8)]
}

/// Two utterances separated by enough silence to finalize each.
fn two_utterances() -> Vec<FramePhase> {
    vec![loud(6), silent(8), loud(6), silent(8)]
}

fn run_pipeline(
    phases: Vec<FramePhase>,
    transcriber: Arc<MockTranscriber>,
    hub: Arc<BroadcastHub>,
    wait: Duration,
) {
    let source = MockFrameSource::new().with_frame_sequence(phases);
    let handle = Pipeline::new(e2e_config())
        .start(
            Box::new(source),
            Arc::new(EnergyScorer::default()),
            transcriber,
            hub,
        )
        .expect("pipeline start");

    thread::sleep(wait);
    handle.stop();
}

#[test]
fn utterances_flow_from_source_to_subscriber_in_order() {
    let hub = Arc::new(BroadcastHub::new());
    let collector = Arc::new(CollectorSubscriber::new());
    hub.register(collector.clone());

    let transcriber = Arc::new(
        MockTranscriber::new("mock").with_responses(&["first utterance", "second utterance"]),
    );
    run_pipeline(
        two_utterances(),
        transcriber.clone(),
        hub,
        Duration::from_millis(900),
    );

    assert_eq!(
        collector.transcripts(),
        vec!["first utterance".to_string(), "second utterance".to_string()]
    );
    assert_eq!(transcriber.call_count(), 2);

    // Every frame also produced a probability event.
    let probabilities = collector
        .events()
        .iter()
        .filter(|e| matches!(e, PipelineEvent::Probability { .. }))
        .count();
    assert!(
        probabilities >= 20,
        "expected one probability event per frame, got {probabilities}"
    );
}

#[test]
fn repeated_identical_transcripts_are_deduplicated() {
    let hub = Arc::new(BroadcastHub::new());
    let collector = Arc::new(CollectorSubscriber::new());
    hub.register(collector.clone());

    let transcriber =
        Arc::new(MockTranscriber::new("mock").with_responses(&["same text", "same text"]));
    run_pipeline(
        two_utterances(),
        transcriber.clone(),
        hub,
        Duration::from_millis(900),
    );

    // Both segments were transcribed, only the first survived the filters.
    assert_eq!(transcriber.call_count(), 2);
    assert_eq!(collector.transcripts(), vec!["same text".to_string()]);
}

#[test]
fn stop_phrase_never_reaches_subscribers() {
    let hub = Arc::new(BroadcastHub::new());
    let collector = Arc::new(CollectorSubscriber::new());
    hub.register(collector.clone());

    let transcriber = Arc::new(MockTranscriber::new("mock").with_response("Thank you."));
    run_pipeline(
        one_utterance(),
        transcriber.clone(),
        hub,
        Duration::from_millis(600),
    );

    assert!(transcriber.call_count() >= 1, "segment should be transcribed");
    assert!(collector.transcripts().is_empty());
}

#[test]
fn transcription_failure_does_not_stop_the_pipeline() {
    let hub = Arc::new(BroadcastHub::new());
    let collector = Arc::new(CollectorSubscriber::new());
    hub.register(collector.clone());

    let transcriber = Arc::new(MockTranscriber::new("mock").with_failure());
    run_pipeline(
        two_utterances(),
        transcriber.clone(),
        hub,
        Duration::from_millis(900),
    );

    // Both segments were attempted; failures dropped both, probabilities
    // kept flowing the whole time.
    assert_eq!(transcriber.call_count(), 2);
    assert!(collector.transcripts().is_empty());
    let probabilities = collector
        .events()
        .iter()
        .filter(|e| matches!(e, PipelineEvent::Probability { .. }))
        .count();
    assert!(probabilities >= 20);
}

/// Subscriber that always rejects delivery.
struct RejectingSubscriber;

impl Subscriber for RejectingSubscriber {
    fn deliver(&self, _event: &PipelineEvent) -> Result<()> {
        Err(VoxgateError::Delivery {
            message: "connection closed".to_string(),
        })
    }

    fn name(&self) -> &str {
        "rejecting"
    }
}

#[test]
fn failing_subscriber_is_dropped_while_healthy_one_continues() {
    let hub = Arc::new(BroadcastHub::new());
    let healthy = Arc::new(CollectorSubscriber::new());
    hub.register(Arc::new(RejectingSubscriber));
    hub.register(healthy.clone());
    assert_eq!(hub.subscriber_count(), 2);

    let transcriber = Arc::new(MockTranscriber::new("mock").with_response("still here"));
    run_pipeline(
        one_utterance(),
        transcriber,
        hub.clone(),
        Duration::from_millis(600),
    );

    assert_eq!(hub.subscriber_count(), 1, "rejecting subscriber removed");
    assert_eq!(healthy.transcripts(), vec!["still here".to_string()]);
}

#[test]
fn subscriber_registered_mid_run_receives_subsequent_events() {
    let hub = Arc::new(BroadcastHub::new());

    let source = MockFrameSource::new()
        .as_live_source()
        .with_frame_sequence(vec![loud(6), silent(30)]);
    let transcriber = Arc::new(MockTranscriber::new("mock").with_response("late joiner"));
    let handle = Pipeline::new(e2e_config())
        .start(
            Box::new(source),
            Arc::new(EnergyScorer::default()),
            transcriber,
            hub.clone(),
        )
        .expect("pipeline start");

    // Register after the pipeline is already producing events.
    thread::sleep(Duration::from_millis(50));
    let collector = Arc::new(CollectorSubscriber::new());
    hub.register(collector.clone());

    thread::sleep(Duration::from_millis(600));
    handle.stop();

    assert!(
        !collector.events().is_empty(),
        "late subscriber should see events published after registration"
    );
}
