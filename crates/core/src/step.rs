//! Phases and step records: the observable trace of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The phase of the agent state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Thinking,
    Acting,
    Observing,
    Completed,
    Error,
}

impl Phase {
    /// `Completed` and `Error` end a run; only a reset leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Acting => "acting",
            Self::Observing => "observing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tool invocation recorded by an `acting` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAction {
    pub tool_name: String,
    /// ID of the model's tool request this action executes
    pub tool_call_id: String,
    /// Parsed arguments; empty when the model sent malformed JSON
    pub input: Map<String, Value>,
}

/// One entry in a run's trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<StepAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Step {
    /// The tool call this step belongs to, for acting and observing steps.
    pub fn tool_call_id(&self) -> Option<&str> {
        self.action.as_ref().map(|a| a.tool_call_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(Phase::Completed.is_terminal());
        assert!(Phase::Error.is_terminal());
        assert!(!Phase::Thinking.is_terminal());
        assert!(!Phase::Acting.is_terminal());
        assert!(!Phase::Observing.is_terminal());
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Phase::Observing).unwrap(), r#""observing""#);
        let parsed: Phase = serde_json::from_str(r#""completed""#).unwrap();
        assert_eq!(parsed, Phase::Completed);
    }

    #[test]
    fn placeholder_step_omits_empty_fields() {
        let step = Step {
            id: "step_1".into(),
            phase: Phase::Thinking,
            thought: None,
            action: None,
            observation: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains(r#""phase":"thinking""#));
        assert!(!json.contains("thought"));
        assert!(step.tool_call_id().is_none());
    }
}
