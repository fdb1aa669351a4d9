//! Transport trait and chat-completions wire types.
//!
//! A [`Transport`] knows how to deliver a [`ChatRequest`] to a remote
//! OpenAI-compatible endpoint and hand back either a decoded
//! [`SendResponse`] or the raw bytes of a server-sent-event stream. Framing
//! and accumulation of those bytes live in the agent crate.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::message::{Message, ToolCallRequest};

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "devstral2", "gpt-4o")
    pub model: String,

    /// The full conversation so far
    pub messages: Vec<Message>,

    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,

    /// "auto", "none", "required" or an object naming a function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: Option<serde_json::Value>) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

/// A tool definition as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Always "function"
    #[serde(rename = "type")]
    pub kind: String,

    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema describing the parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// A complete (non-streaming) response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl SendResponse {
    /// The message of the first choice.
    pub fn message(&self) -> Option<&Message> {
        self.choices.first().and_then(|c| c.message.as_ref())
    }

    /// The text of the first choice, or "" when absent.
    pub fn text(&self) -> &str {
        self.message().map(|m| m.content.as_str()).unwrap_or_default()
    }

    /// The tool calls of the first choice.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        self.message().map(|m| m.tool_calls.as_slice()).unwrap_or_default()
    }

    /// The finish reason of the first choice, or "" when absent.
    pub fn finish_reason(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One decoded `data:` payload of a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Some servers report usage on the last chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// The delta of the first choice.
    pub fn delta(&self) -> Option<&Delta> {
        self.choices.first().and_then(|c| c.delta.as_ref())
    }

    /// Text fragment of the first choice, or "" when absent.
    pub fn text(&self) -> &str {
        self.delta()
            .and_then(|d| d.content.as_deref())
            .unwrap_or_default()
    }

    /// Role announced by the first choice, or "" when absent.
    pub fn role(&self) -> &str {
        self.delta().and_then(|d| d.role.as_deref()).unwrap_or_default()
    }

    /// Finish reason of the first choice, or "" when absent.
    pub fn finish_reason(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// An incremental fragment of the assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

/// Raw response bytes of a streaming request, in network read order.
pub type ByteStream = BoxStream<'static, std::result::Result<Vec<u8>, TransportError>>;

/// The transport collaborator.
///
/// Implementations are responsible for serialization, authentication and
/// mapping non-2xx responses to [`TransportError::ApiError`]. They must be
/// shareable across concurrent loop invocations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// A human-readable name (e.g., "edgee", "scripted").
    fn name(&self) -> &str;

    /// Send a request and decode the complete response.
    async fn send(&self, request: &ChatRequest) -> std::result::Result<SendResponse, TransportError>;

    /// Send a request with streaming enabled and return the live body.
    async fn open_stream(&self, request: &ChatRequest) -> std::result::Result<ByteStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_defaults() {
        let req = ChatRequest::new("devstral2", vec![Message::user("Hello")]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "devstral2");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("stream").is_none());
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
    }

    #[test]
    fn streaming_request_carries_flag_and_tools() {
        let req = ChatRequest::new("m", vec![])
            .streaming(true)
            .with_tools(vec![ToolSpec {
                kind: "function".into(),
                function: FunctionSpec {
                    name: "get_weather".into(),
                    description: Some("Weather".into()),
                    parameters: Some(serde_json::json!({"type": "object"})),
                },
            }])
            .with_tool_choice(Some(serde_json::json!("auto")));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(json["tool_choice"], "auto");
    }

    #[test]
    fn usage_sums() {
        let mut total = Usage::default();
        total += Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 };
        total += Usage { prompt_tokens: 8, completion_tokens: 3, total_tokens: 11 };
        assert_eq!(total, Usage { prompt_tokens: 18, completion_tokens: 8, total_tokens: 26 });
    }

    #[test]
    fn usage_sum_saturates() {
        let mut total = Usage { prompt_tokens: u32::MAX - 1, completion_tokens: 0, total_tokens: u32::MAX };
        total += Usage { prompt_tokens: 5, completion_tokens: 2, total_tokens: 7 };
        assert_eq!(total, Usage { prompt_tokens: u32::MAX, completion_tokens: 2, total_tokens: u32::MAX });
    }

    #[test]
    fn send_response_convenience_accessors() {
        let data = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "devstral2",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }"#;
        let resp: SendResponse = serde_json::from_str(data).unwrap();
        assert_eq!(resp.text(), "Hi");
        assert_eq!(resp.finish_reason(), "stop");
        assert!(resp.tool_calls().is_empty());
        assert_eq!(resp.usage.unwrap().total_tokens, 4);
    }

    #[test]
    fn empty_response_accessors_are_safe() {
        let resp = SendResponse::default();
        assert_eq!(resp.text(), "");
        assert_eq!(resp.finish_reason(), "");
        assert!(resp.message().is_none());
    }

    #[test]
    fn parse_stream_content_delta() {
        let data = r#"{"id":"c","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"role":"assistant","content":"Hello"},"finish_reason":null}]}"#;
        let chunk: StreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(chunk.text(), "Hello");
        assert_eq!(chunk.role(), "assistant");
        assert_eq!(chunk.finish_reason(), "");
    }

    #[test]
    fn parse_stream_tool_call_delta() {
        let data = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_abc","type":"function","function":{"name":"calculator","arguments":""}}]},"finish_reason":null}]}"#;
        let chunk: StreamChunk = serde_json::from_str(data).unwrap();
        let calls = chunk.delta().unwrap().tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].index, Some(0));
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].name(), "calculator");
    }

    #[test]
    fn parse_stream_finish_chunk() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#;
        let chunk: StreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(chunk.finish_reason(), "tool_calls");
        assert_eq!(chunk.text(), "");
    }
}
