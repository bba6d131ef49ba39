//! Data summary tool: summarize_data
//!
//! Lightweight local summary of a delimited data file: row and column
//! counts plus min/mean/max for every numeric column. Enough for "what's in
//! this file" questions without shipping the data anywhere.

use std::fs;
use std::path::Path;
use std::time::Instant;

use switchboard_domain::{
    ToolCall, ToolDefinition, ToolError, ToolMetadata, ToolParameter, ToolResult,
};

/// Tool name constant
pub const SUMMARIZE_DATA: &str = "summarize_data";

/// Maximum file size to summarize (20 MB)
const MAX_DATA_SIZE: u64 = 20 * 1024 * 1024;

/// Get the tool definition for summarize_data
pub fn summarize_data_definition() -> ToolDefinition {
    ToolDefinition::new(
        SUMMARIZE_DATA,
        "Summarize a delimited data file: row/column counts and numeric column statistics",
    )
    .with_parameter(ToolParameter::new("path", "Path to the data file", true))
}

/// Execute the summarize_data tool
pub fn execute_summarize_data(call: &ToolCall, working_dir: Option<&str>) -> ToolResult {
    let start = Instant::now();

    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolResult::failure(SUMMARIZE_DATA, e),
    };

    let candidate = Path::new(path_str);
    let path = match working_dir {
        Some(base) if candidate.is_relative() => Path::new(base).join(candidate),
        _ => candidate.to_path_buf(),
    };

    if !path.is_file() {
        return ToolResult::failure(SUMMARIZE_DATA, ToolError::NotFound(path_str.to_string()));
    }
    match fs::metadata(&path) {
        Ok(metadata) if metadata.len() > MAX_DATA_SIZE => {
            return ToolResult::failure(
                SUMMARIZE_DATA,
                ToolError::InvalidArgument(format!(
                    "file too large ({} bytes, limit {MAX_DATA_SIZE})",
                    metadata.len()
                )),
            );
        }
        Err(e) => {
            return ToolResult::failure(
                SUMMARIZE_DATA,
                ToolError::ExecutionFailed(format!("cannot stat '{path_str}': {e}")),
            );
        }
        _ => {}
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            return ToolResult::failure(
                SUMMARIZE_DATA,
                ToolError::ExecutionFailed(format!("cannot read '{path_str}': {e}")),
            );
        }
    };

    match summarize(&content) {
        Some(summary) => {
            let bytes = content.len();
            ToolResult::success(SUMMARIZE_DATA, summary).with_metadata(ToolMetadata {
                duration_ms: Some(start.elapsed().as_millis() as u64),
                bytes: Some(bytes),
                path: Some(path_str.to_string()),
                ..Default::default()
            })
        }
        None => ToolResult::failure(
            SUMMARIZE_DATA,
            ToolError::InvalidArgument(format!("'{path_str}' has no tabular content")),
        ),
    }
}

fn summarize(content: &str) -> Option<String> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next()?;
    let delimiter = if header_line.contains('\t') { '\t' } else { ',' };
    let headers: Vec<&str> = header_line.split(delimiter).map(str::trim).collect();

    let mut rows = 0usize;
    let mut stats: Vec<Option<ColumnStats>> = vec![Some(ColumnStats::default()); headers.len()];

    for line in lines {
        rows += 1;
        for (index, cell) in line.split(delimiter).enumerate().take(headers.len()) {
            let Some(slot) = stats.get_mut(index) else {
                continue;
            };
            if let Some(column) = slot {
                match cell.trim().parse::<f64>() {
                    Ok(value) => column.record(value),
                    // One non-numeric cell disqualifies the column.
                    Err(_) => *slot = None,
                }
            }
        }
    }

    let mut summary = format!("{} rows, {} columns ({})", rows, headers.len(), headers.join(", "));
    for (header, slot) in headers.iter().zip(&stats) {
        if let Some(column) = slot
            && column.count > 0
        {
            summary.push_str(&format!(
                "\n{}: min {:.2}, mean {:.2}, max {:.2}",
                header,
                column.min,
                column.mean(),
                column.max
            ));
        }
    }
    Some(summary)
}

#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ColumnStats {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_summarize_csv() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "month,revenue,region").unwrap();
        writeln!(temp_file, "jan,100.0,emea").unwrap();
        writeln!(temp_file, "feb,200.0,emea").unwrap();
        writeln!(temp_file, "mar,300.0,apac").unwrap();

        let call = ToolCall::new(SUMMARIZE_DATA)
            .with_arg("path", temp_file.path().to_str().unwrap());
        let result = execute_summarize_data(&call, None);

        assert!(result.is_success());
        let output = result.output().unwrap();
        assert!(output.contains("3 rows, 3 columns"));
        assert!(output.contains("revenue: min 100.00, mean 200.00, max 300.00"));
        // Text columns get no statistics line
        assert!(!output.contains("region: min"));
    }

    #[test]
    fn test_summarize_tsv() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id\tscore").unwrap();
        writeln!(temp_file, "1\t0.5").unwrap();
        writeln!(temp_file, "2\t1.5").unwrap();

        let call = ToolCall::new(SUMMARIZE_DATA)
            .with_arg("path", temp_file.path().to_str().unwrap());
        let result = execute_summarize_data(&call, None);

        assert!(result.is_success());
        assert!(result.output().unwrap().contains("score: min 0.50"));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        let temp_file = NamedTempFile::new().unwrap();
        let call = ToolCall::new(SUMMARIZE_DATA)
            .with_arg("path", temp_file.path().to_str().unwrap());
        let result = execute_summarize_data(&call, None);

        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_missing_file() {
        let call = ToolCall::new(SUMMARIZE_DATA).with_arg("path", "/nope/data.csv");
        let result = execute_summarize_data(&call, None);
        assert_eq!(result.error().unwrap().code(), "NOT_FOUND");
    }
}
