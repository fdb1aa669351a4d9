//! Error types for the Edgee SDK.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all SDK operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Agentic loop ---
    #[error("max tool iterations ({limit}) reached")]
    IterationBudgetExhausted { limit: u32 },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Caller input ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is the iteration budget running out, as opposed to
    /// a transport failure. Callers may retry with a larger budget.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, Self::IterationBudgetExhausted { .. })
    }

    /// The HTTP status carried by an API error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::ApiError { status_code, .. }) => Some(*status_code),
            _ => None,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the transport collaborator. All of them are fatal to the
/// current loop iteration.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API error {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Transport not configured: {0}")]
    NotConfigured(String),
}

/// Failures local to a single tool call. These never stop the loop: the
/// executor turns them into tool-result payloads the model can react to.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Failed to parse arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Shorthand for handler-reported failures.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed(reason.into())
    }

    /// The bare reason, without the category prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::NotFound(reason) | Self::InvalidArguments(reason) | Self::ExecutionFailed(reason) => {
                reason
            }
        }
    }
}

impl From<String> for ToolError {
    fn from(reason: String) -> Self {
        Self::ExecutionFailed(reason)
    }
}

impl From<&str> for ToolError {
    fn from(reason: &str) -> Self {
        Self::ExecutionFailed(reason.to_string())
    }
}
