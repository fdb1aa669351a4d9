//! Events delivered to streaming callers.
//!
//! Per iteration the feed carries zero or more `chunk` events, then for each
//! tool call a `tool_start` immediately followed by its `tool_result`, then
//! one `iteration_complete`. The final iteration only carries chunks.

use edgee_core::message::ToolCallRequest;
use edgee_core::provider::StreamChunk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A decoded stream chunk, re-emitted as it arrives.
    Chunk { chunk: StreamChunk },

    /// A tool call is about to run.
    ToolStart { tool_call: ToolCallRequest },

    /// A tool call finished. `result` is what was written into the conversation.
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: serde_json::Value,
    },

    /// All tool calls of an iteration have been executed.
    IterationComplete { iteration: u32 },
}

impl StreamEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolResult { .. } => "tool_result",
            Self::IterationComplete { .. } => "iteration_complete",
        }
    }

    /// The text fragment of a chunk event, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Chunk { chunk } => Some(chunk.text()).filter(|t| !t.is_empty()),
            _ => None,
        }
    }
}
