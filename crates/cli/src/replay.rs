//! Replay model: serves model responses recorded in a JSON file.
//!
//! The file holds an array of responses in call order:
//!
//! ```json
//! [
//!   {"content": "Let me count", "tool_requests": [
//!     {"id": "call_1", "name": "word_count", "arguments": "{\"text\": \"a b c\"}"}
//!   ]},
//!   {"content": "There are 3 words."}
//! ]
//! ```

use async_trait::async_trait;
use reactloop_core::error::ModelError;
use reactloop_core::message::Message;
use reactloop_core::provider::{ChunkSink, ModelCaller, ModelResponse};
use reactloop_core::tool::ToolDescriptor;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
pub struct ReplayModel {
    responses: Mutex<VecDeque<ModelResponse>>,
}

impl ReplayModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    /// Load a script file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script {}: {e}", path.display()))?;
        let responses: Vec<ModelResponse> = serde_json::from_str(&raw)
            .map_err(|e| format!("Failed to parse script {}: {e}", path.display()))?;
        if responses.is_empty() {
            return Err(format!("Script {} holds no responses", path.display()).into());
        }
        Ok(Self::new(responses))
    }

    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[async_trait]
impl ModelCaller for ReplayModel {
    async fn call(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
        chunks: Option<&dyn ChunkSink>,
    ) -> Result<ModelResponse, ModelError> {
        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| ModelError::InvalidResponse("replay script exhausted".into()))?;

        debug!(
            history = history.len(),
            tools = tools.len(),
            tool_requests = response.tool_requests.len(),
            "Replaying model response"
        );

        if let Some(sink) = chunks {
            for word in response.content.split_inclusive(' ') {
                sink.push(word);
            }
        }
        Ok(response)
    }
}
