//! Tool executor port
//!
//! Uniform `invoke(tool_name, arguments)` surface over every tool the
//! pipeline can reach, local or remote. Tool implementations are external
//! collaborators; the pipeline awaits them and records their results.

use async_trait::async_trait;
use switchboard_domain::{ToolCall, ToolDefinition, ToolResult, ToolSpec};

/// Port for tool execution
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Get the specification of all available tools
    fn tool_spec(&self) -> &ToolSpec;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.tool_spec().get(name).is_some()
    }

    /// Get the definition of a specific tool
    fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_spec().get(name)
    }

    /// Get names of all available tools
    fn available_tools(&self) -> Vec<&str> {
        self.tool_spec().names().collect()
    }

    /// Execute a tool call. Failures come back as failed [`ToolResult`]s,
    /// never as panics or transport errors.
    async fn execute(&self, call: &ToolCall) -> ToolResult;
}
