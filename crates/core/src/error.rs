//! Error types for the ReactLoop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error enum; [`AgentError`] is the run-level
//! error that ends a run in the `error` phase.

use thiserror::Error;

use crate::step::Phase;

/// Run-level failures. Every variant is fatal to the run that raised it and is
/// converted into an unsuccessful `RunResult` by the engine.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("History compaction failed: {0}")]
    Compaction(#[from] CompactionError),

    #[error("Run cancelled by user")]
    Cancelled,

    #[error("Max iterations reached ({0})")]
    MaxIterations(u32),

    #[error("User message must not be empty")]
    EmptyInput,

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("call cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("{tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, Error)]
pub enum CompactionError {
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_failure_is_prefixed() {
        let err = AgentError::from(ModelError::Request("connection reset".into()));
        assert_eq!(err.to_string(), "Model call failed: request failed: connection reset");
    }

    #[test]
    fn max_iterations_names_the_cap() {
        let err = AgentError::MaxIterations(10);
        assert!(err.to_string().contains("Max iterations reached"));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn cancellation_mentions_user() {
        assert!(AgentError::Cancelled.to_string().contains("cancelled by user"));
    }

    #[test]
    fn invalid_transition_names_both_phases() {
        let err = AgentError::InvalidTransition {
            from: Phase::Completed,
            to: Phase::Acting,
        };
        assert_eq!(err.to_string(), "Invalid phase transition: completed -> acting");
    }
}
