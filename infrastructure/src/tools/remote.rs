//! Remote tool families: thin HTTP forwarders.
//!
//! Tool semantics (paper-search ranking, financial metric math) live in the
//! remote services; this client only forwards `invoke(tool_name, arguments)`
//! and maps transport failures onto [`ToolError`]s. Each family gets its own
//! circuit breaker, so one unhealthy backend cannot drag down the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use switchboard_application::{BreakerConfig, CircuitBreaker, GuardedCall};
use switchboard_domain::{ToolCall, ToolDefinition, ToolError, ToolParameter, ToolResult};

/// A configured remote tool family.
struct RemoteFamily {
    endpoint: String,
    breaker: Arc<CircuitBreaker>,
}

/// HTTP forwarder for remote tool families.
pub struct RemoteToolClient {
    client: reqwest::Client,
    families: HashMap<String, RemoteFamily>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RemoteToolResponse {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteToolClient {
    /// `endpoints` maps family name → forwarding URL.
    pub fn new(
        endpoints: &HashMap<String, String>,
        breaker_config: BreakerConfig,
        timeout: Duration,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::ExecutionFailed(format!("http client: {e}")))?;

        let families = endpoints
            .iter()
            .map(|(name, endpoint)| {
                let breaker = Arc::new(CircuitBreaker::new(
                    format!("tools.{name}"),
                    breaker_config.clone(),
                ));
                (
                    name.clone(),
                    RemoteFamily {
                        endpoint: endpoint.clone(),
                        breaker,
                    },
                )
            })
            .collect();

        Ok(Self {
            client,
            families,
            timeout,
        })
    }

    pub fn family_names(&self) -> Vec<&str> {
        self.families.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    /// Generic definitions for the configured families. The remote side owns
    /// the real argument semantics; a free-form query parameter is the
    /// uniform contract.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut names: Vec<&String> = self.families.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                ToolDefinition::new(
                    name.clone(),
                    format!("Remote tool family '{name}'"),
                )
                .with_parameter(ToolParameter::new("query", "Free-form query", false))
            })
            .collect()
    }

    /// Forward one invocation to its family endpoint.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let Some(family) = self.families.get(&call.tool_name) else {
            return ToolResult::failure(
                &call.tool_name,
                ToolError::NotFound(format!("unknown remote tool: {}", call.tool_name)),
            );
        };

        let request = self
            .client
            .post(&family.endpoint)
            .json(&serde_json::json!({
                "tool": call.tool_name,
                "arguments": call.arguments,
            }))
            .send();

        let outcome = family
            .breaker
            .call(self.timeout, async {
                let response = request.await.map_err(|e| {
                    if e.is_timeout() {
                        ToolError::Timeout(call.tool_name.clone())
                    } else {
                        ToolError::ExecutionFailed(e.to_string())
                    }
                })?;
                if !response.status().is_success() {
                    return Err(ToolError::ExecutionFailed(format!(
                        "status {}",
                        response.status()
                    )));
                }
                response
                    .json::<RemoteToolResponse>()
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("bad response: {e}")))
            })
            .await;

        match outcome {
            Ok(RemoteToolResponse {
                output: Some(output),
                ..
            }) => ToolResult::success(&call.tool_name, output),
            Ok(RemoteToolResponse { error, .. }) => ToolResult::failure(
                &call.tool_name,
                ToolError::ExecutionFailed(
                    error.unwrap_or_else(|| "empty remote response".to_string()),
                ),
            ),
            Err(GuardedCall::Open(_)) => {
                warn!(tool = %call.tool_name, "Remote tool family breaker open");
                ToolResult::failure(
                    &call.tool_name,
                    ToolError::ExecutionFailed(format!(
                        "'{}' is temporarily unavailable",
                        call.tool_name
                    )),
                )
            }
            Err(GuardedCall::Timeout) => ToolResult::failure(
                &call.tool_name,
                ToolError::Timeout(call.tool_name.clone()),
            ),
            Err(GuardedCall::Inner(error)) => ToolResult::failure(&call.tool_name, error),
        }
    }
}
