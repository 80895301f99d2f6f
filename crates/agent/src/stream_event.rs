//! Agent lifecycle events as a stream.
//!
//! [`ChannelSink`] turns the callback hooks of [`LifecycleSink`] into a
//! sequence of [`AgentEvent`]s on an unbounded channel, so a caller can drive
//! the run future while draining events elsewhere (or forward them over SSE
//! or a WebSocket; the enum serializes with a `type` tag).

use reactloop_core::agent::RunResult;
use reactloop_core::step::{Phase, Step, StepAction};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::lifecycle::LifecycleSink;

/// Events emitted by the engine during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The state machine entered a new phase.
    PhaseChange { phase: Phase },

    /// A step was recorded.
    Step { step: Step },

    /// The model's reasoning for the current iteration.
    Thought { content: String },

    /// A tool is about to be invoked.
    Action { action: StepAction },

    /// A tool returned (or failed).
    Observation { content: String },

    /// Partial text streamed by the model.
    Chunk { content: String },

    /// The run terminated; always the last event.
    Complete { result: RunResult },

    /// The run failed.
    Error { message: String },
}

impl AgentEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PhaseChange { .. } => "phase_change",
            Self::Step { .. } => "step",
            Self::Thought { .. } => "thought",
            Self::Action { .. } => "action",
            Self::Observation { .. } => "observation",
            Self::Chunk { .. } => "chunk",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

/// A [`LifecycleSink`] that forwards every hook as an [`AgentEvent`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: AgentEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl LifecycleSink for ChannelSink {
    fn on_phase_change(&self, phase: Phase) {
        self.send(AgentEvent::PhaseChange { phase });
    }

    fn on_step(&self, step: &Step) {
        self.send(AgentEvent::Step { step: step.clone() });
    }

    fn on_thought(&self, thought: &str) {
        self.send(AgentEvent::Thought {
            content: thought.to_string(),
        });
    }

    fn on_action(&self, action: &StepAction) {
        self.send(AgentEvent::Action {
            action: action.clone(),
        });
    }

    fn on_observation(&self, observation: &str) {
        self.send(AgentEvent::Observation {
            content: observation.to_string(),
        });
    }

    fn on_chunk(&self, chunk: &str) {
        self.send(AgentEvent::Chunk {
            content: chunk.to_string(),
        });
    }

    fn on_complete(&self, result: &RunResult) {
        self.send(AgentEvent::Complete {
            result: result.clone(),
        });
    }

    fn on_error(&self, error: &str) {
        self.send(AgentEvent::Error {
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_phase_change() {
        let event = AgentEvent::PhaseChange {
            phase: Phase::Acting,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"phase_change","phase":"acting"}"#);
    }

    #[test]
    fn event_serialization_action() {
        let event = AgentEvent::Action {
            action: StepAction {
                tool_name: "search".into(),
                tool_call_id: "call_1".into(),
                input: serde_json::Map::new(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"action""#));
        assert!(json.contains(r#""tool_name":"search""#));
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"chunk","content":"hi"}"#;
        let event: AgentEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, AgentEvent::Chunk { content: "hi".into() });
        assert_eq!(event.event_type(), "chunk");
    }

    #[test]
    fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.on_phase_change(Phase::Thinking);
        sink.on_thought("hmm");
        sink.on_error("boom");

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.event_type())
            .collect();
        assert_eq!(kinds, vec!["phase_change", "thought", "error"]);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_chunk("nobody listening");
    }
}
