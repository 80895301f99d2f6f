//! Model-call capability: the abstraction over LLM backends.
//!
//! The engine calls [`ModelCaller::call`] without knowing which vendor sits
//! behind it. OpenAI-style, Anthropic-style, or Gemini-style adapters each
//! implement this one method; picking one is the caller's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::message::Message;
use crate::tool::{ToolDescriptor, ToolRequest};

/// A resolved model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated text
    pub content: String,

    /// Tool requests; empty means this is a final answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolRequest>,

    /// Token usage statistics, if the provider reports them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ModelResponse {
    /// A plain text response with no tool requests.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A response requesting one or more tools.
    pub fn with_tools(content: impl Into<String>, tool_requests: Vec<ToolRequest>) -> Self {
        Self {
            content: content.into(),
            tool_requests,
            usage: None,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Receives partial text while a model call is still streaming.
pub trait ChunkSink: Send + Sync {
    fn push(&self, chunk: &str);
}

/// Calls a language model with the current history and tool set.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Send `history` to the model and wait for the resolved response.
    ///
    /// Streaming implementations push partial text into `chunks` zero or
    /// more times before returning. Implementations must not retry on the
    /// engine's behalf unless that is their own documented policy.
    async fn call(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
        chunks: Option<&dyn ChunkSink>,
    ) -> Result<ModelResponse, ModelError>;
}
