//! Remote model gateway port
//!
//! The single network dependency of the pipeline: one completion endpoint
//! used for classification fallback and orchestration planning. Every call
//! through this port goes through a circuit breaker.

use async_trait::async_trait;
use switchboard_domain::{ToolCall, ToolDefinition};
use thiserror::Error;

/// Errors that can occur talking to the remote model.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,
}

/// The closed response schema for a completion call.
///
/// Anything the adapter cannot map into one of these two shapes surfaces as
/// [`GatewayError::InvalidResponse`] — responses are never parsed ad hoc.
#[derive(Debug, Clone)]
pub enum ModelReply {
    /// Plain text answer; for planning calls this means "no tool needed".
    Text(String),
    /// A single requested tool invocation.
    ToolCall(ToolCall),
}

impl ModelReply {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ModelReply::Text(text) => Some(text),
            ModelReply::ToolCall(_) => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            ModelReply::ToolCall(call) => Some(call),
            ModelReply::Text(_) => None,
        }
    }
}

/// Gateway for remote model completion.
#[async_trait]
pub trait ModelGatewayPort: Send + Sync {
    /// Complete a prompt. When `tools` is provided the model may answer with
    /// a tool call from that set instead of text.
    async fn complete(
        &self,
        prompt: &str,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelReply, GatewayError>;
}
