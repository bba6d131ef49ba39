//! HTTP model gateway — OpenAI-compatible chat-completions adapter.
//!
//! Maps the wire response into the closed [`ModelReply`] schema: the first
//! tool call wins, otherwise the message text. Anything else is
//! `InvalidResponse`; the callers treat that as fallback, never as content.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use switchboard_application::{GatewayError, ModelGatewayPort, ModelReply};
use switchboard_domain::{ToolCall, ToolDefinition};

/// Gateway for an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpModelGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpModelGateway {
    /// `endpoint` is the API base, e.g. `http://localhost:11434/v1`.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

// ==================== Wire types ====================

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object, per the OpenAI wire format.
    arguments: String,
}

/// Convert tool definitions into the wire's function-tool schema.
fn tool_schema(tools: &[ToolDefinition]) -> Vec<serde_json::Value> {
    tools
        .iter()
        .map(|tool| {
            let properties: serde_json::Map<String, serde_json::Value> = tool
                .parameters
                .iter()
                .map(|param| {
                    (
                        param.name.clone(),
                        serde_json::json!({
                            "type": "string",
                            "description": param.description,
                        }),
                    )
                })
                .collect();
            let required: Vec<&str> = tool
                .parameters
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.as_str())
                .collect();

            serde_json::json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    },
                },
            })
        })
        .collect()
}

/// Map a wire response into the closed reply schema.
fn parse_completion(response: CompletionResponse) -> Result<ModelReply, GatewayError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".to_string()))?;

    if let Some(wire_call) = choice.message.tool_calls.into_iter().next() {
        let arguments: HashMap<String, serde_json::Value> =
            serde_json::from_str(&wire_call.function.arguments).map_err(|e| {
                GatewayError::InvalidResponse(format!("malformed tool arguments: {e}"))
            })?;
        return Ok(ModelReply::ToolCall(ToolCall {
            tool_name: wire_call.function.name,
            arguments,
        }));
    }

    match choice.message.content {
        Some(content) => Ok(ModelReply::Text(content)),
        None => Err(GatewayError::InvalidResponse(
            "neither text nor tool call in response".to_string(),
        )),
    }
}

#[async_trait]
impl ModelGatewayPort for HttpModelGateway {
    async fn complete(
        &self,
        prompt: &str,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelReply, GatewayError> {
        let body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![WireMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            tools: tools.map(tool_schema),
        };

        debug!(model = %self.model, tools = tools.map_or(0, |t| t.len()), "Completion request");

        let response = self
            .client
            .post(self.completions_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else if e.is_connect() {
                    GatewayError::ConnectionError(e.to_string())
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        parse_completion(parsed)
    }
}
