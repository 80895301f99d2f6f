//! Step recorder: builds timestamped step records with unique IDs.

use chrono::Utc;
use reactloop_core::step::{Phase, Step, StepAction};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Process-wide sequence so two recorders never hand out the same ID, even
/// within one millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Issues step records. IDs look like `step_<unix-millis>_<seq>_<random>` and
/// are unique within the process lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRecorder;

impl StepRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh step ID.
    pub fn next_id(&self) -> String {
        let now = Utc::now();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let random = Uuid::new_v4().simple().to_string();
        format!("step_{}_{}_{}", now.timestamp_millis(), seq, &random[..8])
    }

    /// A bare step in `phase` with no content.
    pub fn step(&self, phase: Phase) -> Step {
        Step {
            id: self.next_id(),
            phase,
            thought: None,
            action: None,
            observation: None,
            timestamp: Utc::now(),
        }
    }

    /// A placeholder thinking step; its thought is filled in once the model
    /// responds.
    pub fn thinking(&self) -> Step {
        self.step(Phase::Thinking)
    }

    pub fn acting(&self, tool_name: &str, tool_call_id: &str, input: Map<String, Value>) -> Step {
        Step {
            action: Some(StepAction {
                tool_name: tool_name.to_string(),
                tool_call_id: tool_call_id.to_string(),
                input,
            }),
            ..self.step(Phase::Acting)
        }
    }

    /// An observing step for the tool call described by `action`.
    pub fn observing(&self, action: StepAction, observation: impl Into<String>) -> Step {
        Step {
            action: Some(action),
            observation: Some(observation.into()),
            ..self.step(Phase::Observing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let recorder = StepRecorder::new();
        let ids: HashSet<String> = (0..1000).map(|_| recorder.next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn id_format() {
        let id = StepRecorder::new().next_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "step");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[3].len(), 8);
    }

    #[test]
    fn thinking_is_a_placeholder() {
        let step = StepRecorder::new().thinking();
        assert_eq!(step.phase, Phase::Thinking);
        assert!(step.thought.is_none());
        assert!(step.action.is_none());
    }

    #[test]
    fn observing_keeps_the_action() {
        let recorder = StepRecorder::new();
        let acting = recorder.acting("search", "call_1", Map::new());
        let action = acting.action.clone().unwrap();
        let observing = recorder.observing(action, "no results");
        assert_eq!(observing.phase, Phase::Observing);
        assert_eq!(observing.tool_call_id(), Some("call_1"));
        assert_eq!(observing.observation.as_deref(), Some("no results"));
        assert_ne!(observing.id, acting.id);
    }
}
