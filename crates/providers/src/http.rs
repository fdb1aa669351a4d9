//! HTTP transport for the Edgee gateway.
//!
//! Works with any endpoint that speaks the OpenAI-compatible
//! `/v1/chat/completions` protocol:
//! - non-streaming requests decode straight into [`SendResponse`]
//! - streaming requests hand back the raw SSE body; framing happens in the
//!   agent crate.

use async_trait::async_trait;
use edgee_config::ClientConfig;
use edgee_core::error::TransportError;
use edgee_core::provider::{ByteStream, ChatRequest, SendResponse, Transport};
use futures::StreamExt;
use tracing::{debug, warn};

/// A [`Transport`] over `reqwest`.
pub struct HttpTransport {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `base_url` (scheme and host, no API path).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        connect_timeout: std::time::Duration,
    ) -> Result<Self, TransportError> {
        // No total timeout: streamed answers may legitimately run for minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::NotConfigured(e.to_string()))?;

        Ok(Self {
            url: edgee_config::completions_url(base_url),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a transport from resolved configuration. Fails when no API key
    /// is available.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let api_key = config
            .require_api_key()
            .map_err(|e| TransportError::NotConfigured(e.to_string()))?;
        Self::new(&config.base_url, api_key, config.connect_timeout())
    }

    /// The endpoint requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, TransportError> {
        let mut builder = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json");

        if request.stream {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Gateway returned error");
            return Err(TransportError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        Ok(response)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "edgee"
    }

    async fn send(&self, request: &ChatRequest) -> Result<SendResponse, TransportError> {
        debug!(model = %request.model, messages = request.messages.len(), "Sending completion request");

        let response = self.post(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        debug!(model = %request.model, messages = request.messages.len(), "Sending streaming request");

        let response = self.post(request).await?;
        let stream = response.bytes_stream().map(|item| {
            item.map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::StreamInterrupted(e.to_string()))
        });

        Ok(stream.boxed())
    }
}
