//! Broadcast station: drains the merged event channel into the hub.
//!
//! Probability events (from the detector) and transcription events (from
//! the transcriber) arrive on one channel and fan out to every subscriber.
//! Once shutdown is signaled, remaining events are drained without
//! delivery so late transcription results are discarded rather than
//! published after stop.

use crate::broadcast::BroadcastHub;
use crate::events::PipelineEvent;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Station that publishes pipeline events to the broadcast hub.
pub struct BroadcastStation {
    hub: Arc<BroadcastHub>,
    running: Arc<AtomicBool>,
}

impl BroadcastStation {
    /// Creates a broadcast station. `running` gates delivery: events
    /// processed after it flips to false are dropped.
    pub fn new(hub: Arc<BroadcastHub>, running: Arc<AtomicBool>) -> Self {
        Self { hub, running }
    }
}

impl Station for BroadcastStation {
    type Input = PipelineEvent;
    type Output = ();

    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn process(&mut self, event: PipelineEvent) -> Result<Option<()>, StationError> {
        if self.running.load(Ordering::SeqCst) {
            self.hub.publish(&event);
        }
        Ok(None)
    }
}
