//! Shared scripted collaborators for engine tests.

use async_trait::async_trait;
use reactloop_core::error::{ModelError, ToolError};
use reactloop_core::message::Message;
use reactloop_core::provider::{ChunkSink, ModelCaller, ModelResponse};
use reactloop_core::tool::{ToolDescriptor, ToolExecutor, ToolRequest};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A model that returns a sequence of scripted results.
///
/// Each call pops the next entry and records the history it was given.
/// Once the script runs out every call fails.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    chunks: Vec<String>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ModelResponse, ModelError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            chunks: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Push these chunks into the chunk sink (when one is offered) on every call.
    pub fn streaming(mut self, chunks: &[&str]) -> Self {
        self.chunks = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    /// A model that answers immediately.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![ModelResponse::text(text)])
    }

    /// First requests `tool` with `args`, then answers.
    pub fn tool_then_answer(tool: &str, args: &str, answer: &str) -> Self {
        Self::new(vec![
            ModelResponse::with_tools(
                format!("I should use {tool}"),
                vec![ToolRequest::new(format!("call_{tool}"), tool, args)],
            ),
            ModelResponse::text(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Histories passed to each call, in call order.
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelCaller for ScriptedModel {
    async fn call(
        &self,
        history: &[Message],
        _tools: &[ToolDescriptor],
        chunks: Option<&dyn ChunkSink>,
    ) -> Result<ModelResponse, ModelError> {
        self.seen.lock().unwrap().push(history.to_vec());
        if let Some(sink) = chunks {
            for chunk in &self.chunks {
                sink.push(chunk);
            }
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::InvalidResponse("script exhausted".into())))
    }
}

/// Echoes the tool name and arguments back, recording every call.
#[derive(Default)]
pub struct EchoTools {
    calls: Mutex<Vec<(String, Value)>>,
}

impl EchoTools {
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for EchoTools {
    async fn execute(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        Ok(format!("{name} -> {arguments}"))
    }
}

/// Every tool call fails.
pub struct FailingTools;

#[async_trait]
impl ToolExecutor for FailingTools {
    async fn execute(&self, name: &str, _arguments: Value) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: name.to_string(),
            reason: "service unavailable".into(),
        })
    }
}

/// A response requesting `tool` once, with a unique call ID per iteration.
pub fn tool_request_response(iteration: usize, tool: &str, args: &str) -> ModelResponse {
    ModelResponse::with_tools(
        format!("iteration {iteration}"),
        vec![ToolRequest::new(format!("call_{iteration}"), tool, args)],
    )
}
