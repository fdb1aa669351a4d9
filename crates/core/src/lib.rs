//! # Edgee Core
//!
//! Domain types, traits, and error definitions for the Edgee SDK.
//! This crate has no runtime dependencies: it defines the domain model
//! (messages, wire types, tools, the transport contract) that the other
//! crates implement against.

pub mod error;
pub mod input;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, ToolError, TransportError};
pub use input::{DEFAULT_MAX_ITERATIONS, Input, InputObject, SimpleInput};
pub use message::{Conversation, FunctionCall, Message, Role, ToolCallRequest};
pub use provider::{
    ByteStream, ChatRequest, Choice, Delta, FunctionSpec, SendResponse, StreamChoice, StreamChunk,
    ToolSpec, Transport, Usage,
};
pub use tool::{Arguments, ExecutableTool, ToolBuilder, ToolDefinition, ToolHandler, ToolRegistry};
