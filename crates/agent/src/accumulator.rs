//! Folds streamed deltas into one complete assistant turn.
//!
//! Tool calls arrive in pieces: the first fragment usually carries the id,
//! type and name, later ones only slices of the argument text. Fragments are
//! matched to an in-progress call by non-empty id, otherwise by position
//! (the wire `index` when present, else the fragment's place in the delta).

use edgee_core::message::{Message, ToolCallRequest};
use edgee_core::provider::{Delta, StreamChunk, Usage};

/// Accumulates one turn. Use a fresh accumulator per request.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    role: String,
    content: String,
    calls: Vec<PendingCall>,
    finish_reason: String,
    usage: Option<Usage>,
}

#[derive(Debug)]
struct PendingCall {
    position: u32,
    call: ToolCallRequest,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the first choice of a decoded chunk.
    pub fn push(&mut self, chunk: &StreamChunk) {
        if let Some(choice) = chunk.choices.first() {
            if let Some(delta) = &choice.delta {
                self.push_delta(delta);
            }
            if let Some(reason) = choice.finish_reason.as_deref().filter(|r| !r.is_empty()) {
                self.finish_reason = reason.to_string();
            }
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
    }

    pub fn push_delta(&mut self, delta: &Delta) {
        if self.role.is_empty() {
            if let Some(role) = delta.role.as_deref() {
                self.role = role.to_string();
            }
        }

        if let Some(text) = delta.content.as_deref() {
            self.content.push_str(text);
        }

        for (pos, fragment) in delta.tool_calls.iter().flatten().enumerate() {
            self.merge(pos as u32, fragment);
        }
    }

    fn merge(&mut self, pos: u32, fragment: &ToolCallRequest) {
        let position = fragment.index.unwrap_or(pos);
        let existing = if fragment.id.is_empty() {
            self.calls.iter_mut().rev().find(|p| p.position == position)
        } else if let Some(i) = self.calls.iter().position(|p| p.call.id == fragment.id) {
            self.calls.get_mut(i)
        } else {
            // The id may arrive after the first fragments of the same call.
            self.calls
                .iter_mut()
                .rev()
                .find(|p| p.position == position && p.call.id.is_empty())
        };

        let Some(pending) = existing else {
            let mut call = fragment.clone();
            call.index = None;
            self.calls.push(PendingCall { position, call });
            return;
        };

        let call = &mut pending.call;
        if !fragment.id.is_empty() {
            call.id.clone_from(&fragment.id);
        }
        if !fragment.kind.is_empty() {
            call.kind.clone_from(&fragment.kind);
        }
        if !fragment.function.name.is_empty() {
            call.function.name.clone_from(&fragment.function.name);
        }
        call.function.arguments.push_str(&fragment.function.arguments);
    }

    /// Text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Finish the turn.
    pub fn finish(self) -> AssembledTurn {
        let tool_calls = self
            .calls
            .into_iter()
            .map(|p| finalize_call(p.call))
            .collect();

        AssembledTurn {
            role: if self.role.is_empty() { "assistant".into() } else { self.role },
            content: self.content,
            tool_calls,
            finish_reason: self.finish_reason,
            usage: self.usage,
        }
    }
}

/// Strip correlation data and default the call type.
pub fn finalize_call(mut call: ToolCallRequest) -> ToolCallRequest {
    call.index = None;
    if call.kind.is_empty() {
        call.kind = "function".into();
    }
    call
}

/// A complete assistant turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledTurn {
    pub role: String,
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub finish_reason: String,
    pub usage: Option<Usage>,
}

impl AssembledTurn {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message to append to the conversation.
    pub fn to_message(&self) -> Message {
        Message::assistant_with_tools(self.content.clone(), self.tool_calls.clone())
    }
}
