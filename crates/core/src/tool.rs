//! Tool descriptors, tool requests, and the tool-execution capability.
//!
//! The engine never looks inside tool arguments: they are opaque JSON handed
//! to whatever [`ToolExecutor`] the caller supplies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ToolError;

/// A tool the model may call, sent along with every model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool name (unique within a run)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    #[serde(default)]
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A model-issued instruction to run a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Unique ID for this request, echoed back in the tool message
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as serialized JSON text
    pub arguments: String,
}

impl ToolRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw argument text into a JSON object.
    ///
    /// Text that is not valid JSON, or valid JSON that is not an object,
    /// yields an empty map.
    pub fn parse_arguments(&self) -> Map<String, Value> {
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                debug!(tool = %self.name, call_id = %self.id, kind = %json_kind(&other), "Tool arguments are not an object");
                Map::new()
            }
            Err(e) => {
                debug!(tool = %self.name, call_id = %self.id, error = %e, "Malformed tool arguments");
                Map::new()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Executes a named tool on behalf of the engine.
///
/// Failures are returned as [`ToolError`]; the engine turns them into an
/// observation for the model instead of failing the run.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: Value) -> Result<String, ToolError>;
}
