//! The ReactLoop engine.
//!
//! The engine follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Receive** a user utterance and any prior conversation
//! 2. **Compact** the history under the token budget
//! 3. **Think**: send the history and tool set to the model
//! 4. **If tool requests**: execute each tool, append the results, loop back to 2
//! 5. **If text only**: that text is the final answer
//!
//! The loop also ends on cancellation, on a model or compaction failure, or
//! when the iteration cap is reached. Every run resolves to a
//! [`RunResult`](reactloop_core::RunResult).

pub mod cancel;
pub mod compaction;
pub mod engine;
pub mod lifecycle;
pub mod prompt;
pub mod recorder;
pub mod state;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cancel::CancelHandle;
pub use compaction::{PassthroughCompactor, WindowCompactor};
pub use engine::{Collaborators, ReactEngine};
pub use lifecycle::{LifecycleSink, NoopSink};
pub use recorder::StepRecorder;
pub use state::AgentState;
pub use stream_event::{AgentEvent, ChannelSink};
