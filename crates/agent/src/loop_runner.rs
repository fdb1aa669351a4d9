//! The agentic tool-execution loop.
//!
//! Each iteration sends the full conversation plus tool definitions, folds
//! the answer into one assistant turn and, if that turn asks for tools, runs
//! them and appends their results before asking again. The loop ends when a
//! turn carries no tool calls or the iteration budget runs out.

use std::sync::Arc;

use edgee_core::error::{Error, Result, TransportError};
use edgee_core::input::{DEFAULT_MAX_ITERATIONS, Input};
use edgee_core::message::{Conversation, Message};
use edgee_core::provider::{ChatRequest, SendResponse, ToolSpec, Transport, Usage};
use edgee_core::tool::ToolRegistry;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::accumulator::{DeltaAccumulator, finalize_call};
use crate::executor::ToolExecutor;
use crate::stream_event::StreamEvent;
use crate::stream_reader::ChunkReader;

/// Default capacity of the chunk and event channels.
pub const DEFAULT_STREAM_BUFFER: usize = 10;

/// Result of a completed [`AgentLoop::run`].
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The final response. `usage` holds the sum over all iterations.
    pub response: SendResponse,
    /// Every message exchanged, seed messages included
    pub conversation: Conversation,
    /// Requests issued
    pub iterations: u32,
}

impl AgentResponse {
    /// The final answer text.
    pub fn text(&self) -> &str {
        self.response.text()
    }

    pub fn usage(&self) -> Usage {
        self.response.usage.unwrap_or_default()
    }
}

/// Drives request → stream → execute cycles against a transport.
///
/// Cheap to clone; the registry is shared read-only and every invocation
/// owns its own conversation.
#[derive(Clone)]
pub struct AgentLoop {
    transport: Arc<dyn Transport>,
    registry: Arc<ToolRegistry>,
    max_iterations: u32,
    stream_buffer: usize,
}

/// Why a streaming run stopped early.
enum Stop {
    /// The caller dropped the event receiver
    ConsumerGone,
    Failed(Error),
}

impl From<Error> for Stop {
    fn from(e: Error) -> Self {
        Self::Failed(e)
    }
}

impl From<TransportError> for Stop {
    fn from(e: TransportError) -> Self {
        Self::Failed(e.into())
    }
}

/// Per-invocation state.
struct Turn {
    model: String,
    conversation: Conversation,
    tools: Vec<ToolSpec>,
    tool_choice: Option<serde_json::Value>,
}

impl Turn {
    fn request(&self) -> ChatRequest {
        ChatRequest::new(self.model.clone(), self.conversation.messages().to_vec())
            .with_tools(self.tools.clone())
            .with_tool_choice(self.tool_choice.clone())
    }
}

impl AgentLoop {
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            transport,
            registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Set the maximum number of requests per invocation.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the capacity of the chunk and event channels.
    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Registry tools first, then input tools whose names aren't taken.
    fn tool_specs(&self, extra: Vec<ToolSpec>) -> Vec<ToolSpec> {
        let mut specs = self.registry.specs();
        specs.extend(
            extra
                .into_iter()
                .filter(|spec| !self.registry.contains(&spec.function.name)),
        );
        specs
    }

    fn start(&self, model: &str, input: Input) -> Turn {
        let (messages, extra, tool_choice) = input.into_parts();
        Turn {
            model: model.to_string(),
            conversation: Conversation::from(messages),
            tools: self.tool_specs(extra),
            tool_choice,
        }
    }

    /// Run the loop with non-streaming requests.
    pub async fn run(&self, model: &str, input: impl Into<Input>) -> Result<AgentResponse> {
        let limit = self.max_iterations;
        if limit == 0 {
            return Err(Error::IterationBudgetExhausted { limit });
        }

        let mut turn = self.start(model, input.into());
        let executor = ToolExecutor::new(Arc::clone(&self.registry));
        let mut usage = Usage::default();

        info!(model, max_iterations = limit, tools = turn.tools.len(), "Starting agent loop");

        for iteration in 1..=limit {
            debug!(iteration, messages = turn.conversation.len(), "Agent loop iteration");

            let mut response = self.transport.send(&turn.request()).await?;
            if let Some(u) = response.usage {
                usage += u;
            }

            let mut message = response
                .message()
                .cloned()
                .unwrap_or_else(|| Message::assistant(""));
            message.tool_calls = message.tool_calls.into_iter().map(finalize_call).collect();

            if !message.has_tool_calls() {
                turn.conversation.push(message);
                response.usage = Some(usage);
                info!(iterations = iteration, total_tokens = usage.total_tokens, "Agent loop complete");
                return Ok(AgentResponse {
                    response,
                    conversation: turn.conversation,
                    iterations: iteration,
                });
            }

            debug!(tool_count = message.tool_calls.len(), "Executing tool calls");
            let calls = message.tool_calls.clone();
            turn.conversation.push(message);

            for call in &calls {
                let outcome = executor.execute(call).await;
                turn.conversation.push(outcome.message);
            }
        }

        warn!(limit, "Max tool iterations reached");
        Err(Error::IterationBudgetExhausted { limit })
    }

    /// Run the loop with streaming requests in a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn stream(&self, model: &str, input: impl Into<Input>) -> AgentStream {
        let this = self.clone();
        let turn = self.start(model, input.into());
        spawn_feed(self.stream_buffer, move |events| this.drive(turn, events))
    }

    async fn drive(self, mut turn: Turn, events: mpsc::Sender<StreamEvent>) -> std::result::Result<(), Stop> {
        let limit = self.max_iterations;
        if limit == 0 {
            return Err(Error::IterationBudgetExhausted { limit }.into());
        }

        let executor = ToolExecutor::new(Arc::clone(&self.registry));

        info!(model = %turn.model, max_iterations = limit, tools = turn.tools.len(), "Starting streaming agent loop");

        for iteration in 1..=limit {
            debug!(iteration, messages = turn.conversation.len(), "Agent loop iteration");

            let request = turn.request().streaming(true);
            let body = self.transport.open_stream(&request).await?;
            let mut reader = ChunkReader::spawn(body, self.stream_buffer);
            let mut acc = DeltaAccumulator::new();

            while let Some(item) = reader.next().await {
                let chunk = item?;
                acc.push(&chunk);
                emit(&events, StreamEvent::Chunk { chunk }).await?;
            }

            let assembled = acc.finish();
            if !assembled.has_tool_calls() {
                turn.conversation.push(assembled.to_message());
                info!(iterations = iteration, "Streaming agent loop complete");
                return Ok(());
            }

            debug!(tool_count = assembled.tool_calls.len(), "Executing tool calls");
            turn.conversation.push(assembled.to_message());

            for call in assembled.tool_calls {
                emit(&events, StreamEvent::ToolStart { tool_call: call.clone() }).await?;
                let outcome = executor.execute(&call).await;
                turn.conversation.push(outcome.message);
                emit(
                    &events,
                    StreamEvent::ToolResult {
                        tool_call_id: call.id,
                        tool_name: call.function.name,
                        result: outcome.result,
                    },
                )
                .await?;
            }

            emit(&events, StreamEvent::IterationComplete { iteration }).await?;
        }

        warn!(limit, "Max tool iterations reached");
        Err(Error::IterationBudgetExhausted { limit }.into())
    }
}

/// Stream one request without tool execution. Only `Chunk` events are
/// produced.
pub fn stream_once(
    transport: Arc<dyn Transport>,
    request: ChatRequest,
    buffer: usize,
) -> AgentStream {
    spawn_feed(buffer, move |events| async move {
        let body = transport.open_stream(&request.streaming(true)).await?;
        let mut reader = ChunkReader::spawn(body, buffer);
        while let Some(item) = reader.next().await {
            emit(&events, StreamEvent::Chunk { chunk: item? }).await?;
        }
        Ok::<(), Stop>(())
    })
}

async fn emit(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> std::result::Result<(), Stop> {
    events.send(event).await.map_err(|_| {
        debug!("Event receiver dropped, stopping");
        Stop::ConsumerGone
    })
}

fn spawn_feed<F, Fut>(buffer: usize, drive: F) -> AgentStream
where
    F: FnOnce(mpsc::Sender<StreamEvent>) -> Fut,
    Fut: Future<Output = std::result::Result<(), Stop>> + Send + 'static,
{
    let (event_tx, events) = mpsc::channel(buffer.max(1));
    let (error_tx, error) = oneshot::channel();
    let feed = drive(event_tx);

    tokio::spawn(async move {
        // The event sender lives inside `feed` and is dropped with it, so the
        // feed closes before any error becomes visible.
        let outcome = feed.await;
        if let Err(Stop::Failed(e)) = outcome {
            warn!(error = %e, "Agent stream failed");
            let _ = error_tx.send(e);
        }
    });

    AgentStream { events, error }
}

/// Live event feed of a streaming run.
///
/// Dropping it (or the receiver from [`AgentStream::into_parts`]) stops the
/// run at its next emission.
#[derive(Debug)]
pub struct AgentStream {
    events: mpsc::Receiver<StreamEvent>,
    error: oneshot::Receiver<Error>,
}

impl AgentStream {
    /// The next event, or `None` once the feed is closed.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Drain any remaining events and report how the run ended.
    pub async fn finish(mut self) -> Result<()> {
        while self.events.recv().await.is_some() {}
        match self.error.await {
            Ok(e) => Err(e),
            Err(_) => Ok(()),
        }
    }

    /// Collect every event, then report how the run ended.
    pub async fn collect(mut self) -> Result<Vec<StreamEvent>> {
        let mut out = Vec::new();
        while let Some(event) = self.events.recv().await {
            out.push(event);
        }
        match self.error.await {
            Ok(e) => Err(e),
            Err(_) => Ok(out),
        }
    }

    /// Split into an event stream and the error receiver.
    pub fn into_parts(self) -> (ReceiverStream<StreamEvent>, oneshot::Receiver<Error>) {
        (ReceiverStream::new(self.events), self.error)
    }
}
