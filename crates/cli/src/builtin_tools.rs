//! Built-in demo tools offered to replayed runs.

use async_trait::async_trait;
use reactloop_core::error::ToolError;
use reactloop_core::tool::{ToolDescriptor, ToolExecutor};
use serde_json::{Value, json};

/// `echo`, `word_count`, and `clock`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTools;

impl BuiltinTools {
    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                "echo",
                "Repeat the given text back",
                json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            ),
            ToolDescriptor::new(
                "word_count",
                "Count the words in a piece of text",
                json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            ),
            ToolDescriptor::new(
                "clock",
                "Current UTC date and time (RFC 3339)",
                json!({ "type": "object", "properties": {} }),
            ),
        ]
    }
}

fn text_arg(arguments: &Value) -> Result<&str, ToolError> {
    arguments
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments("missing string field 'text'".into()))
}

#[async_trait]
impl ToolExecutor for BuiltinTools {
    async fn execute(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        match name {
            "echo" => Ok(text_arg(&arguments)?.to_string()),
            "word_count" => Ok(text_arg(&arguments)?.split_whitespace().count().to_string()),
            "clock" => Ok(chrono::Utc::now().to_rfc3339()),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}
