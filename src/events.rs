//! Event types delivered to subscribers.
//!
//! Both event shapes serialize as tagged JSON objects so hosts can forward
//! them over any text transport without re-encoding.

use serde::{Deserialize, Serialize};

/// Events published by a running pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Speech probability for a single audio frame, in [0.0, 1.0].
    /// Emitted for every frame, independent of segmentation.
    Probability { probability: f32 },
    /// Final transcript of one completed speech segment.
    Transcription { text: String },
}

impl PipelineEvent {
    /// Serialize the event to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize an event from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_json_roundtrip() {
        let event = PipelineEvent::Probability { probability: 0.42 };
        let json = event.to_json().expect("should serialize");
        let deserialized = PipelineEvent::from_json(&json).expect("should deserialize");
        assert_eq!(event, deserialized);
    }

    #[test]
    fn transcription_json_roundtrip() {
        let event = PipelineEvent::Transcription {
            text: "hello world".to_string(),
        };
        let json = event.to_json().expect("should serialize");
        let deserialized = PipelineEvent::from_json(&json).expect("should deserialize");
        assert_eq!(event, deserialized);
    }

    #[test]
    fn probability_wire_format() {
        let event = PipelineEvent::Probability { probability: 0.5 };
        let json = event.to_json().expect("should serialize");
        assert_eq!(json, r#"{"type":"probability","probability":0.5}"#);
    }

    #[test]
    fn transcription_wire_format() {
        let event = PipelineEvent::Transcription {
            text: "test".to_string(),
        };
        let json = event.to_json().expect("should serialize");
        assert_eq!(json, r#"{"type":"transcription","text":"test"}"#);
    }

    #[test]
    fn unknown_tag_fails_to_parse() {
        let result = PipelineEvent::from_json(r#"{"type":"bogus","value":1}"#);
        assert!(result.is_err());
    }
}
