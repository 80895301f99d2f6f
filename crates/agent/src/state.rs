//! Agent state machine: phase, iteration counter, history, and token total
//! for a single run.
//!
//! ```text
//! thinking ──► acting ──► observing ──► thinking
//!    │                       │  ▲
//!    │                       └──┘ (next tool request)
//!    └──► completed                 any ──► error
//! ```
//!
//! `completed` and `error` are terminal. Nothing leaves them; a finished
//! state is discarded rather than reused.

use reactloop_core::error::{AgentError, Result};
use reactloop_core::message::Message;
use reactloop_core::step::{Phase, Step};
use serde::Serialize;

/// Mutable state of one run. Owned by the engine for the run's duration.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    pub phase: Phase,
    pub steps: Vec<Step>,
    pub messages: Vec<Message>,
    /// 1-indexed once the first iteration has begun
    pub iteration: u32,
    pub max_iterations: u32,
    pub total_tokens: usize,
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentState {
    /// Fresh state for a new run, starting in `thinking`.
    pub fn new(max_iterations: u32, messages: Vec<Message>) -> Self {
        Self {
            phase: Phase::Thinking,
            steps: Vec::new(),
            messages,
            iteration: 0,
            max_iterations,
            total_tokens: 0,
            running: true,
            error: None,
        }
    }

    /// Whether the machine may move from `from` to `to`.
    pub fn allows(from: Phase, to: Phase) -> bool {
        use Phase::*;
        match (from, to) {
            (Completed | Error, _) => false,
            (_, Error) => true,
            (Thinking, Thinking | Acting | Completed) => true,
            (Acting, Observing) => true,
            (Observing, Acting | Thinking) => true,
            _ => false,
        }
    }

    /// Move to `next`. Returns `true` when the phase actually changed.
    pub fn transition(&mut self, next: Phase) -> Result<bool> {
        if !Self::allows(self.phase, next) {
            return Err(AgentError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        let changed = self.phase != next;
        self.phase = next;
        if next.is_terminal() {
            self.running = false;
        }
        Ok(changed)
    }

    /// Start the next iteration. Returns `false`, leaving the counter alone,
    /// when that would exceed the cap.
    pub fn begin_iteration(&mut self) -> bool {
        if self.iteration >= self.max_iterations {
            return false;
        }
        self.iteration += 1;
        true
    }

    /// Append a step and return its index.
    pub fn record(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    /// Fill in the thought of the placeholder thinking step at `index`.
    pub fn fill_thought(&mut self, index: usize, thought: &str) -> Result<()> {
        match self.steps.get_mut(index) {
            Some(step) if step.phase == Phase::Thinking && step.thought.is_none() => {
                step.thought = Some(thought.to_string());
                Ok(())
            }
            _ => Err(AgentError::Internal(format!(
                "step {index} is not a pending thinking step"
            ))),
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// End the run in `error`. Valid from any phase that is not already
    /// terminal; a terminal state is left as is.
    pub fn fail(&mut self, error: &str) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = Phase::Error;
        self.running = false;
        self.error = Some(error.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::StepRecorder;

    #[test]
    fn starts_thinking_and_running() {
        let state = AgentState::new(10, vec![Message::user("hi")]);
        assert_eq!(state.phase, Phase::Thinking);
        assert!(state.running);
        assert_eq!(state.iteration, 0);
    }

    #[test]
    fn full_cycle_is_allowed() {
        let mut state = AgentState::new(10, vec![]);
        assert!(state.transition(Phase::Acting).unwrap());
        assert!(state.transition(Phase::Observing).unwrap());
        assert!(state.transition(Phase::Acting).unwrap());
        assert!(state.transition(Phase::Observing).unwrap());
        assert!(state.transition(Phase::Thinking).unwrap());
        assert!(!state.transition(Phase::Thinking).unwrap());
        assert!(state.transition(Phase::Completed).unwrap());
        assert!(!state.running);
    }

    #[test]
    fn acting_requires_observing_next() {
        let mut state = AgentState::new(10, vec![]);
        state.transition(Phase::Acting).unwrap();
        let err = state.transition(Phase::Thinking).unwrap_err();
        assert!(matches!(
            err,
            AgentError::InvalidTransition {
                from: Phase::Acting,
                to: Phase::Thinking
            }
        ));
        assert!(state.transition(Phase::Completed).is_err());
    }

    #[test]
    fn terminal_phases_are_final() {
        let mut state = AgentState::new(10, vec![]);
        state.transition(Phase::Completed).unwrap();
        assert!(state.transition(Phase::Thinking).is_err());
        assert!(state.transition(Phase::Error).is_err());
        assert!(!state.fail("late"));
        assert!(state.error.is_none());
    }

    #[test]
    fn iteration_cap() {
        let mut state = AgentState::new(2, vec![]);
        assert!(state.begin_iteration());
        assert!(state.begin_iteration());
        assert!(!state.begin_iteration());
        assert_eq!(state.iteration, 2);
    }

    #[test]
    fn thought_is_filled_once() {
        let mut state = AgentState::new(1, vec![]);
        let idx = state.record(StepRecorder::new().thinking());
        state.fill_thought(idx, "I should search").unwrap();
        assert_eq!(state.steps[idx].thought.as_deref(), Some("I should search"));
        assert!(state.fill_thought(idx, "again").is_err());
        assert!(state.fill_thought(7, "missing").is_err());
    }

    #[test]
    fn fail_records_error() {
        let mut state = AgentState::new(1, vec![]);
        state.transition(Phase::Acting).unwrap();
        assert!(state.fail("boom"));
        assert_eq!(state.phase, Phase::Error);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(!state.running);
    }
}
