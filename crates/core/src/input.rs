//! Caller input, resolved once at the entry boundary.
//!
//! Callers may hand in plain text, a structured turn, or an untyped JSON
//! value. Everything is normalised into [`Input`] before any request is
//! built, so the loop never inspects the caller's shape again.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::message::Message;
use crate::provider::ToolSpec;
use crate::tool::ExecutableTool;

/// Default iteration budget for the agentic loop.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Structured input: explicit messages plus optional wire tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputObject {
    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
}

impl InputObject {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }
}

/// Conversation input for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A single user message
    Text(String),
    /// A prepared turn
    Turn(InputObject),
}

impl Input {
    /// Resolve an untyped value: a JSON string, or an object with
    /// `messages` and optional `tools` / `tool_choice`.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(text) => Ok(Self::Text(text)),
            serde_json::Value::Object(_) => {
                let object: InputObject = serde_json::from_value(value)
                    .map_err(|e| Error::InvalidInput(format!("malformed input object: {e}")))?;
                Ok(Self::Turn(object))
            }
            other => Err(Error::InvalidInput(format!(
                "expected a string or an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Split into seed messages, extra wire tools and tool choice.
    pub fn into_parts(self) -> (Vec<Message>, Vec<ToolSpec>, Option<serde_json::Value>) {
        match self {
            Self::Text(text) => (vec![Message::user(text)], Vec::new(), None),
            Self::Turn(object) => (object.messages, object.tools, object.tool_choice),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<InputObject> for Input {
    fn from(object: InputObject) -> Self {
        Self::Turn(object)
    }
}

impl From<Vec<Message>> for Input {
    fn from(messages: Vec<Message>) -> Self {
        Self::Turn(InputObject::new(messages))
    }
}

/// Input for automatic tool execution: a prompt, the tools the model may
/// call, and the iteration budget.
#[derive(Debug, Clone)]
pub struct SimpleInput {
    pub text: String,
    pub tools: Vec<ExecutableTool>,
    pub max_iterations: u32,
}

impl SimpleInput {
    pub fn new(text: impl Into<String>, tools: impl IntoIterator<Item = ExecutableTool>) -> Self {
        Self {
            text: text.into(),
            tools: tools.into_iter().collect(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }
}
