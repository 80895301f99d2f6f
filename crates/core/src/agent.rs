//! The outcome of a run.

use serde::{Deserialize, Serialize};

use crate::step::{Phase, Step};

/// The single value a run resolves to, whatever the termination reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The full step trace, in recording order
    pub steps: Vec<Step>,

    /// Iterations consumed
    pub total_iterations: u32,

    /// Running token total at termination
    pub total_tokens: usize,
}

impl RunResult {
    pub fn success(answer: impl Into<String>, steps: Vec<Step>, iterations: u32, tokens: usize) -> Self {
        Self {
            success: true,
            final_answer: Some(answer.into()),
            error: None,
            steps,
            total_iterations: iterations,
            total_tokens: tokens,
        }
    }

    pub fn failure(error: impl Into<String>, steps: Vec<Step>, iterations: u32, tokens: usize) -> Self {
        Self {
            success: false,
            final_answer: None,
            error: Some(error.into()),
            steps,
            total_iterations: iterations,
            total_tokens: tokens,
        }
    }

    /// Number of recorded steps in `phase`.
    pub fn count(&self, phase: Phase) -> usize {
        self.steps.iter().filter(|s| s.phase == phase).count()
    }

    /// The phases of the recorded steps, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.steps.iter().map(|s| s.phase).collect()
    }
}
