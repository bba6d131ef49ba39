//! Tool registry: local executor plus remote families behind one port.
//!
//! Tool names resolve to exactly one backend; local tools win a name
//! conflict because they are always reachable.

use async_trait::async_trait;

use switchboard_application::ToolExecutorPort;
use switchboard_domain::{ToolCall, ToolResult, ToolSpec};

use super::local::LocalToolExecutor;
use super::remote::RemoteToolClient;

/// Uniform tool surface for the pipeline.
pub struct ToolRegistry {
    local: LocalToolExecutor,
    remote: Option<RemoteToolClient>,
    spec: ToolSpec,
}

impl ToolRegistry {
    pub fn new(local: LocalToolExecutor, remote: Option<RemoteToolClient>) -> Self {
        let mut spec = ToolSpec::new();
        if let Some(remote) = &remote {
            for definition in remote.definitions() {
                spec = spec.register(definition);
            }
        }
        // Local definitions registered last: on a name collision the local
        // tool replaces the remote one.
        for definition in local.tool_spec().all() {
            spec = spec.register(definition.clone());
        }

        Self {
            local,
            remote,
            spec,
        }
    }

    pub fn local_only(local: LocalToolExecutor) -> Self {
        Self::new(local, None)
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        if self.local.tool_spec().get(&call.tool_name).is_some() {
            return self.local.execute(call).await;
        }
        match &self.remote {
            Some(remote) if remote.has_family(&call.tool_name) => remote.invoke(call).await,
            _ => self.local.execute(call).await, // yields the NOT_FOUND failure
        }
    }
}
