//! Fan-out delivery of pipeline events to a dynamic set of subscribers.
//!
//! The hub tolerates partial failure: a subscriber whose delivery fails is
//! dropped from the set and everyone else still receives the event.

use crate::error::Result;
use crate::events::PipelineEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Delivery sink for pipeline events.
///
/// Implementations map a subscriber to whatever transport the host uses
/// (a websocket, a channel, a log). `deliver` is called from the pipeline's
/// dispatch context and must not block for long.
pub trait Subscriber: Send + Sync {
    /// Deliver one event. An error unregisters this subscriber.
    fn deliver(&self, event: &PipelineEvent) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &str {
        "subscriber"
    }
}

/// Opaque handle identifying a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Fan-out hub over a mutable subscriber set.
///
/// Registration and unregistration may race freely with `publish`; every
/// publish iterates over a membership snapshot taken under the lock, so no
/// iteration can observe a half-modified set. Delivery itself happens
/// outside the lock.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<u64, Arc<dyn Subscriber>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber and returns its id.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, subscriber);
        SubscriberId(id)
    }

    /// Removes a subscriber. Returns false if the id was not registered
    /// (e.g. already removed after a delivery failure).
    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.lock().remove(&id.0).is_some()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Delivers `event` to every registered subscriber.
    ///
    /// Never fails: a subscriber error is logged, that subscriber is
    /// unregistered, and delivery continues for the rest.
    pub fn publish(&self, event: &PipelineEvent) {
        let snapshot: Vec<(u64, Arc<dyn Subscriber>)> = self
            .lock()
            .iter()
            .map(|(&id, sub)| (id, Arc::clone(sub)))
            .collect();

        let mut failed = Vec::new();
        for (id, subscriber) in snapshot {
            if let Err(e) = subscriber.deliver(event) {
                eprintln!(
                    "voxgate: dropping subscriber '{}': {}",
                    subscriber.name(),
                    e
                );
                failed.push(id);
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.lock();
            for id in failed {
                subscribers.remove(&id);
            }
        }
    }

    /// A poisoned lock only means another publisher panicked mid-update;
    /// the map itself is still structurally sound, so keep going.
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Arc<dyn Subscriber>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Subscriber that accumulates every event it receives.
///
/// Used by tests and by hosts that want to poll instead of push.
#[derive(Default)]
pub struct CollectorSubscriber {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectorSubscriber {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events received so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Returns only the transcription texts received so far.
    pub fn transcripts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::Transcription { text } => Some(text),
                PipelineEvent::Probability { .. } => None,
            })
            .collect()
    }
}

impl Subscriber for CollectorSubscriber {
    fn deliver(&self, event: &PipelineEvent) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Subscriber that writes events to stdout.
///
/// Transcriptions always print; per-frame probabilities only when enabled
/// (they arrive ~30 times per second). With `json` set, events print as
/// their wire-format JSON instead of human-readable lines.
pub struct StdoutSubscriber {
    show_probabilities: bool,
    json: bool,
}

impl StdoutSubscriber {
    /// Creates a subscriber printing transcriptions only.
    pub fn new() -> Self {
        Self {
            show_probabilities: false,
            json: false,
        }
    }

    /// Also print per-frame probabilities.
    pub fn with_probabilities(mut self, show: bool) -> Self {
        self.show_probabilities = show;
        self
    }

    /// Print events as JSON lines.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for StdoutSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscriber for StdoutSubscriber {
    fn deliver(&self, event: &PipelineEvent) -> Result<()> {
        match event {
            PipelineEvent::Probability { probability } => {
                if self.show_probabilities {
                    if self.json {
                        if let Ok(line) = event.to_json() {
                            println!("{}", line);
                        }
                    } else {
                        println!("probability {:.2}", probability);
                    }
                }
            }
            PipelineEvent::Transcription { text } => {
                if self.json {
                    if let Ok(line) = event.to_json() {
                        println!("{}", line);
                    }
                } else {
                    println!("{}", text);
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}
