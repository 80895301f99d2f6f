//! Lifecycle sink: observer hooks for a run.
//!
//! Every hook is optional and is invoked synchronously, in the exact order
//! the events occur, before the engine does any further side-effecting work.
//! A caller can therefore render "now searching" before the search returns.

use reactloop_core::agent::RunResult;
use reactloop_core::provider::ChunkSink;
use reactloop_core::step::{Phase, Step, StepAction};
use std::sync::Mutex;

pub trait LifecycleSink: Send + Sync {
    fn on_phase_change(&self, _phase: Phase) {}
    fn on_step(&self, _step: &Step) {}
    fn on_thought(&self, _thought: &str) {}
    fn on_action(&self, _action: &StepAction) {}
    fn on_observation(&self, _observation: &str) {}
    fn on_chunk(&self, _chunk: &str) {}
    fn on_complete(&self, _result: &RunResult) {}
    fn on_error(&self, _error: &str) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LifecycleSink for NoopSink {}

/// Chunk sink handed to the model during one call: forwards each chunk to
/// the lifecycle sink and keeps the text as a fallback for empty content.
pub(crate) struct StreamBuffer<'a> {
    sink: &'a dyn LifecycleSink,
    text: Mutex<String>,
}

impl<'a> StreamBuffer<'a> {
    pub(crate) fn new(sink: &'a dyn LifecycleSink) -> Self {
        Self {
            sink,
            text: Mutex::new(String::new()),
        }
    }

    pub(crate) fn into_text(self) -> String {
        self.text.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl ChunkSink for StreamBuffer<'_> {
    fn push(&self, chunk: &str) {
        self.text
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_str(chunk);
        self.sink.on_chunk(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountChunks(Mutex<usize>);

    impl LifecycleSink for CountChunks {
        fn on_chunk(&self, _chunk: &str) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn stream_buffer_accumulates_and_forwards() {
        let counter = CountChunks(Mutex::new(0));
        let buffer = StreamBuffer::new(&counter);
        buffer.push("The answer ");
        buffer.push("is 42");
        assert_eq!(buffer.into_text(), "The answer is 42");
        assert_eq!(*counter.0.lock().unwrap(), 2);
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let sink = NoopSink;
        sink.on_phase_change(Phase::Thinking);
        sink.on_chunk("x");
        sink.on_error("nothing happens");
    }
}
