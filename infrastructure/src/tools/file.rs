//! File tools: read_file, find_files

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use switchboard_domain::{
    ToolCall, ToolDefinition, ToolError, ToolMetadata, ToolParameter, ToolResult,
};

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const FIND_FILES: &str = "find_files";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Cap on reported search matches
const MAX_MATCHES: usize = 200;

/// Get the tool definition for read_file
pub fn read_file_definition() -> ToolDefinition {
    ToolDefinition::new(READ_FILE, "Read the contents of a file at the given path")
        .with_parameter(ToolParameter::new("path", "Path to the file to read", true))
}

/// Get the tool definition for find_files
pub fn find_files_definition() -> ToolDefinition {
    ToolDefinition::new(
        FIND_FILES,
        "Find files matching a glob pattern, searching recursively",
    )
    .with_parameter(ToolParameter::new(
        "pattern",
        "Glob pattern, e.g. *.py or src/**/*.rs",
        true,
    ))
}

fn resolve(path: &str, working_dir: Option<&str>) -> PathBuf {
    let candidate = Path::new(path);
    match working_dir {
        Some(base) if candidate.is_relative() => Path::new(base).join(candidate),
        _ => candidate.to_path_buf(),
    }
}

/// Execute the read_file tool
pub fn execute_read_file(call: &ToolCall, working_dir: Option<&str>) -> ToolResult {
    let start = Instant::now();

    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolResult::failure(READ_FILE, e),
    };
    let path = resolve(path_str, working_dir);

    if !path.exists() {
        return ToolResult::failure(READ_FILE, ToolError::NotFound(path_str.to_string()));
    }
    if !path.is_file() {
        return ToolResult::failure(
            READ_FILE,
            ToolError::InvalidArgument(format!("'{path_str}' is not a file")),
        );
    }

    let size = match fs::metadata(&path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            return ToolResult::failure(
                READ_FILE,
                ToolError::ExecutionFailed(format!("cannot stat '{path_str}': {e}")),
            );
        }
    };
    if size > MAX_READ_SIZE {
        return ToolResult::failure(
            READ_FILE,
            ToolError::InvalidArgument(format!(
                "file too large ({size} bytes, limit {MAX_READ_SIZE})"
            )),
        );
    }

    match fs::read_to_string(&path) {
        Ok(content) => {
            let bytes = content.len();
            ToolResult::success(READ_FILE, content).with_metadata(ToolMetadata {
                duration_ms: Some(start.elapsed().as_millis() as u64),
                bytes: Some(bytes),
                path: Some(path_str.to_string()),
                ..Default::default()
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            ToolResult::failure(READ_FILE, ToolError::PermissionDenied(path_str.to_string()))
        }
        Err(e) => ToolResult::failure(
            READ_FILE,
            ToolError::ExecutionFailed(format!("cannot read '{path_str}': {e}")),
        ),
    }
}

/// Execute the find_files tool
pub fn execute_find_files(call: &ToolCall, working_dir: Option<&str>) -> ToolResult {
    let start = Instant::now();

    let pattern = match call.require_string("pattern") {
        Ok(p) => p,
        Err(e) => return ToolResult::failure(FIND_FILES, e),
    };

    // Bare patterns search the whole tree under the working directory.
    let full_pattern = if pattern.contains('/') {
        resolve(pattern, working_dir).to_string_lossy().into_owned()
    } else {
        resolve(&format!("**/{pattern}"), working_dir)
            .to_string_lossy()
            .into_owned()
    };

    let paths = match glob::glob(&full_pattern) {
        Ok(paths) => paths,
        Err(e) => {
            return ToolResult::failure(
                FIND_FILES,
                ToolError::InvalidArgument(format!("bad pattern '{pattern}': {e}")),
            );
        }
    };

    let mut matches: Vec<String> = Vec::new();
    for entry in paths.flatten() {
        if matches.len() >= MAX_MATCHES {
            break;
        }
        matches.push(entry.display().to_string());
    }

    let count = matches.len();
    let output = if matches.is_empty() {
        format!("No files matching '{pattern}'")
    } else {
        matches.join("\n")
    };

    ToolResult::success(FIND_FILES, output).with_metadata(ToolMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        match_count: Some(count),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_file_success() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Hello, World!").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let call = ToolCall::new(READ_FILE).with_arg("path", path);
        let result = execute_read_file(&call, None);

        assert!(result.is_success());
        assert!(result.output().unwrap().contains("Hello, World!"));
        assert!(result.metadata.bytes.unwrap() > 0);
    }

    #[test]
    fn test_read_file_not_found() {
        let call = ToolCall::new(READ_FILE).with_arg("path", "/nonexistent/file.txt");
        let result = execute_read_file(&call, None);

        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().code(), "NOT_FOUND");
    }

    #[test]
    fn test_read_file_missing_argument() {
        let call = ToolCall::new(READ_FILE);
        let result = execute_read_file(&call, None);
        assert_eq!(result.error().unwrap().code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_read_file_relative_to_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "remember this").unwrap();

        let call = ToolCall::new(READ_FILE).with_arg("path", "notes.txt");
        let result = execute_read_file(&call, Some(dir.path().to_str().unwrap()));

        assert!(result.is_success());
        assert_eq!(result.output(), Some("remember this"));
    }

    #[test]
    fn test_find_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "").unwrap();
        fs::write(dir.path().join("b.py"), "").unwrap();
        fs::write(dir.path().join("c.rs"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/d.py"), "").unwrap();

        let call = ToolCall::new(FIND_FILES).with_arg("pattern", "*.py");
        let result = execute_find_files(&call, Some(dir.path().to_str().unwrap()));

        assert!(result.is_success());
        assert_eq!(result.metadata.match_count, Some(3));
        let output = result.output().unwrap();
        assert!(output.contains("a.py"));
        assert!(output.contains("d.py"));
        assert!(!output.contains("c.rs"));
    }

    #[test]
    fn test_find_files_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let call = ToolCall::new(FIND_FILES).with_arg("pattern", "*.zig");
        let result = execute_find_files(&call, Some(dir.path().to_str().unwrap()));

        assert!(result.is_success());
        assert_eq!(result.metadata.match_count, Some(0));
        assert!(result.output().unwrap().contains("No files matching"));
    }
}
