//! The streaming agentic tool-execution engine of the Edgee SDK.
//!
//! One run follows a **request → stream → execute** cycle:
//!
//! 1. **Request** a completion with the full conversation and tool definitions
//! 2. **Stream** the SSE body, decoding and accumulating deltas
//! 3. **If tool calls**: execute them, append results, loop back to step 1
//! 4. **If text only**: the turn is final
//!
//! The loop also stops with an error when the iteration budget runs out.

pub mod accumulator;
pub mod client;
pub mod executor;
pub mod loop_runner;
pub mod sse;
pub mod stream_event;
pub mod stream_reader;

pub use accumulator::{AssembledTurn, DeltaAccumulator};
pub use client::Client;
pub use executor::{ToolExecutor, ToolOutcome};
pub use loop_runner::{AgentLoop, AgentResponse, AgentStream, DEFAULT_STREAM_BUFFER};
pub use sse::{ChunkDecoder, Frame, FrameParser};
pub use stream_event::StreamEvent;
pub use stream_reader::ChunkReader;
