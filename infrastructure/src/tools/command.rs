//! Command execution tool: run_command

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use switchboard_domain::{
    ToolCall, ToolDefinition, ToolError, ToolMetadata, ToolParameter, ToolResult,
};

/// Tool name constant
pub const RUN_COMMAND: &str = "run_command";

/// Maximum captured output (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Get the tool definition for run_command
pub fn run_command_definition() -> ToolDefinition {
    ToolDefinition::new(
        RUN_COMMAND,
        "Execute a shell command and return its output. Use with caution.",
    )
    .with_parameter(ToolParameter::new("command", "The command to execute", true))
}

/// Execute the run_command tool
pub async fn execute_run_command(
    call: &ToolCall,
    working_dir: Option<&str>,
    timeout: Duration,
) -> ToolResult {
    let start = Instant::now();

    let command_str = match call.require_string("command") {
        Ok(c) => c,
        Err(e) => return ToolResult::failure(RUN_COMMAND, e),
    };

    let mut cmd = Command::new("sh");
    cmd.args(["-c", command_str])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return ToolResult::failure(
                RUN_COMMAND,
                ToolError::ExecutionFailed(format!("failed to spawn command: {e}")),
            );
        }
        Err(_) => {
            return ToolResult::failure(
                RUN_COMMAND,
                ToolError::Timeout(format!(
                    "command did not finish within {}s",
                    timeout.as_secs()
                )),
            );
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut combined = String::new();
    combined.push_str(stdout.trim_end());
    if !stderr.trim().is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(stderr.trim_end());
    }
    if combined.len() > MAX_OUTPUT_SIZE {
        let mut end = MAX_OUTPUT_SIZE;
        while !combined.is_char_boundary(end) {
            end -= 1;
        }
        combined.truncate(end);
    }

    let metadata = ToolMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        exit_code: Some(exit_code),
        ..Default::default()
    };

    if output.status.success() {
        if combined.is_empty() {
            combined = "(no output)".to_string();
        }
        ToolResult::success(RUN_COMMAND, combined).with_metadata(metadata)
    } else {
        ToolResult::failure(
            RUN_COMMAND,
            ToolError::ExecutionFailed(format!("exit code {exit_code}: {combined}")),
        )
        .with_metadata(metadata)
    }
}
