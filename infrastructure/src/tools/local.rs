//! Local tool executor — the in-process implementation of
//! [`ToolExecutorPort`].
//!
//! Dispatches by tool name to the modules in this directory. Everything here
//! runs against the local machine, which is what lets Local-mode requests
//! bypass the governor and breakers entirely.

use std::time::Duration;

use async_trait::async_trait;

use switchboard_application::ToolExecutorPort;
use switchboard_domain::{ToolCall, ToolError, ToolResult, ToolSpec};

use super::{command, data, file, local_tool_spec, location};

/// Executor that runs tools on the local machine.
#[derive(Debug, Clone)]
pub struct LocalToolExecutor {
    tool_spec: ToolSpec,
    /// Base directory for file and command tools (None = process cwd).
    working_dir: Option<String>,
    command_timeout: Duration,
}

impl LocalToolExecutor {
    pub fn new() -> Self {
        Self {
            tool_spec: local_tool_spec(),
            working_dir: None,
            command_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }
}

impl Default for LocalToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutorPort for LocalToolExecutor {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        match call.tool_name.as_str() {
            location::CURRENT_LOCATION => {
                location::execute_current_location(call, self.working_dir())
            }
            file::READ_FILE => file::execute_read_file(call, self.working_dir()),
            file::FIND_FILES => file::execute_find_files(call, self.working_dir()),
            command::RUN_COMMAND => {
                command::execute_run_command(call, self.working_dir(), self.command_timeout).await
            }
            data::SUMMARIZE_DATA => data::execute_summarize_data(call, self.working_dir()),
            other => ToolResult::failure(
                other,
                ToolError::NotFound(format!("unknown local tool: {other}")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "hi").unwrap();
        let executor = LocalToolExecutor::new().with_working_dir(dir.path().to_str().unwrap());

        let read = executor
            .execute(&ToolCall::new("read_file").with_arg("path", "x.txt"))
            .await;
        assert!(read.is_success());

        let find = executor
            .execute(&ToolCall::new("find_files").with_arg("pattern", "*.txt"))
            .await;
        assert_eq!(find.metadata.match_count, Some(1));

        let location = executor.execute(&ToolCall::new("current_location")).await;
        assert!(location.output().unwrap().contains(
            dir.path().file_name().unwrap().to_str().unwrap()
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = LocalToolExecutor::new();
        let result = executor.execute(&ToolCall::new("levitate")).await;
        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().code(), "NOT_FOUND");
    }
}
