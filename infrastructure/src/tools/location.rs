//! Location tool: current_location

use switchboard_domain::{ToolCall, ToolDefinition, ToolError, ToolMetadata, ToolResult};

/// Tool name constant
pub const CURRENT_LOCATION: &str = "current_location";

/// Get the tool definition for current_location
pub fn current_location_definition() -> ToolDefinition {
    ToolDefinition::new(
        CURRENT_LOCATION,
        "Report the current working directory of the assistant process",
    )
}

/// Execute the current_location tool
pub fn execute_current_location(_call: &ToolCall, working_dir: Option<&str>) -> ToolResult {
    if let Some(dir) = working_dir {
        return ToolResult::success(CURRENT_LOCATION, dir).with_metadata(ToolMetadata {
            path: Some(dir.to_string()),
            ..Default::default()
        });
    }

    match std::env::current_dir() {
        Ok(path) => {
            let display = path.display().to_string();
            ToolResult::success(CURRENT_LOCATION, &display).with_metadata(ToolMetadata {
                path: Some(display.clone()),
                ..Default::default()
            })
        }
        Err(e) => ToolResult::failure(
            CURRENT_LOCATION,
            ToolError::ExecutionFailed(format!("cannot resolve working directory: {e}")),
        ),
    }
}
