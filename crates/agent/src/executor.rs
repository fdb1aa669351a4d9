//! Runs one assembled tool call against the registry.
//!
//! Every outcome, success or not, becomes exactly one tool-result message.
//! Failures are written as `{"error": "..."}` so the model can react to them
//! on the next iteration; they never abort the loop.

use std::sync::Arc;

use edgee_core::error::ToolError;
use edgee_core::message::{Message, ToolCallRequest};
use edgee_core::tool::{Arguments, ToolRegistry};
use serde_json::Value;
use tracing::{debug, warn};

/// Result of executing one tool call.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// The value written into the tool message, also carried by the event
    pub result: Value,
    /// Role `tool`, correlated to the call id
    pub message: Message,
    pub is_error: bool,
}

/// Executes tool calls against a shared registry.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, call: &ToolCallRequest) -> ToolOutcome {
        let (result, is_error) = match self.invoke(call).await {
            Ok(value) => {
                debug!(tool = %call.name(), id = %call.id, "Tool executed");
                (value, false)
            }
            Err(e) => {
                warn!(tool = %call.name(), id = %call.id, error = %e, "Tool call failed");
                (serde_json::json!({ "error": e.to_string() }), true)
            }
        };

        ToolOutcome {
            message: Message::tool_result(call.id.clone(), result.to_string()),
            result,
            is_error,
        }
    }

    async fn invoke(&self, call: &ToolCallRequest) -> Result<Value, ToolError> {
        let tool = self
            .registry
            .get(call.name())
            .ok_or_else(|| ToolError::NotFound(call.name().to_string()))?;

        let arguments = parse_arguments(call.arguments())?;
        let handler = tool.handler();

        tokio::task::spawn_blocking(move || handler.call(arguments))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    ToolError::failed("handler panicked")
                } else {
                    ToolError::failed(e.to_string())
                }
            })?
            .map_err(|e| ToolError::failed(e.reason()))
    }
}

/// Parse raw argument text into an object. Blank text means no arguments.
pub fn parse_arguments(raw: &str) -> Result<Arguments, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Arguments::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::InvalidArguments(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(ToolError::InvalidArguments(e.to_string())),
    }
}
