//! Caller-facing entry point.
//!
//! A [`Client`] bundles resolved configuration with a transport and exposes
//! the four request styles: single-shot, plain streaming, and the agentic
//! loop in both flavours.

use std::sync::Arc;

use edgee_config::{ClientConfig, ConfigError};
use edgee_core::error::{Error, Result};
use edgee_core::input::{Input, SimpleInput};
use edgee_core::provider::{ChatRequest, SendResponse, Transport};
use edgee_core::tool::ToolRegistry;
use edgee_providers::HttpTransport;
use tracing::debug;

use crate::loop_runner::{AgentLoop, AgentResponse, AgentStream, stream_once};

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

fn config_error(e: ConfigError) -> Error {
    Error::Config { message: e.to_string() }
}

impl Client {
    /// Build a client over HTTP. An empty API key or base URL falls back to
    /// `EDGEE_API_KEY` / `EDGEE_BASE_URL`. Fails when the configuration is
    /// invalid or still has no API key.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_env(config, |key| std::env::var(key).ok())
    }

    fn with_env(mut config: ClientConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        config.fill_missing(lookup);
        config.validate().map_err(config_error)?;
        config.require_api_key().map_err(config_error)?;
        let transport = HttpTransport::from_config(&config)?;
        debug!(url = %transport.url(), "Created HTTP client");
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Build a client from `~/.edgee/config.toml` and `EDGEE_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::load().map_err(config_error)?)
    }

    /// Build a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn request(model: &str, input: Input) -> ChatRequest {
        let (messages, tools, tool_choice) = input.into_parts();
        ChatRequest::new(model, messages)
            .with_tools(tools)
            .with_tool_choice(tool_choice)
    }

    /// One request, no tool execution.
    pub async fn send(&self, model: &str, input: impl Into<Input>) -> Result<SendResponse> {
        let request = Self::request(model, input.into());
        Ok(self.transport.send(&request).await?)
    }

    /// One streamed request, no tool execution. Only chunk events are
    /// produced.
    pub fn stream(&self, model: &str, input: impl Into<Input>) -> AgentStream {
        let request = Self::request(model, input.into());
        stream_once(Arc::clone(&self.transport), request, self.config.stream_buffer)
    }

    /// Run the agentic loop to completion.
    pub async fn send_with_tools(&self, model: &str, input: SimpleInput) -> Result<AgentResponse> {
        let (agent, text) = self.agent_for(input);
        agent.run(model, text).await
    }

    /// Run the agentic loop with a live event feed.
    pub fn stream_with_tools(&self, model: &str, input: SimpleInput) -> AgentStream {
        let (agent, text) = self.agent_for(input);
        agent.stream(model, text)
    }

    fn agent_for(&self, input: SimpleInput) -> (AgentLoop, String) {
        let registry: ToolRegistry = input.tools.into_iter().collect();
        let agent = self
            .agent(Arc::new(registry))
            .with_max_iterations(input.max_iterations);
        (agent, input.text)
    }

    /// An agent loop over a shared registry, with budget and buffer taken
    /// from the configuration.
    pub fn agent(&self, registry: Arc<ToolRegistry>) -> AgentLoop {
        AgentLoop::new(Arc::clone(&self.transport), registry)
            .with_max_iterations(self.config.max_iterations)
            .with_stream_buffer(self.config.stream_buffer)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.name())
            .field("config", &self.config)
            .finish()
    }
}
