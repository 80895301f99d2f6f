//! # ReactLoop Core
//!
//! Domain types, collaborator traits, and error definitions for the ReactLoop
//! reasoning engine. This crate has **no async runtime dependency**: it defines
//! the model that the engine and its callers implement against.
//!
//! ## Collaborators
//!
//! The engine needs exactly three capabilities from its environment, each a
//! one-method trait defined here:
//! - [`ModelCaller`]: call the model with a history and a tool set
//! - [`ToolExecutor`]: execute a named tool with JSON arguments
//! - [`HistoryCompactor`]: shorten a history under a token budget

pub mod agent;
pub mod compaction;
pub mod error;
pub mod message;
pub mod provider;
pub mod step;
pub mod token;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::RunResult;
pub use compaction::{CompactedHistory, HistoryCompactor};
pub use error::{AgentError, CompactionError, ModelError, Result, ToolError};
pub use message::{Message, Role};
pub use provider::{ChunkSink, ModelCaller, ModelResponse, Usage};
pub use step::{Phase, Step, StepAction};
pub use tool::{ToolDescriptor, ToolExecutor, ToolRequest};
