//! Local-path dispatch.
//!
//! Local routes execute in-process against the tool executor with no
//! governor slot and no circuit breaker, so backend unavailability can never
//! stall them. The dispatcher derives the tool call's arguments from the
//! request text and wraps the single tool result as a draft for validation.

use std::sync::Arc;

use tracing::debug;

use switchboard_domain::{
    IntentKind, PlanStep, Request, RoutePlan, RuleInput, ToolCall, ToolCallPlan,
};

use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::Draft;

/// Canned reply for empty input.
const EMPTY_INPUT_REPLY: &str =
    "Hi! Tell me what you need — I can look around the working directory, read files, \
     or dig into data for you.";

/// Canned reply when classification degraded and nothing else applies.
const UNCLASSIFIED_REPLY: &str =
    "I'm not sure what you're after there — could you rephrase your request?";

/// Extension vocabulary for deriving search patterns from prose.
const EXTENSION_WORDS: &[(&str, &str)] = &[
    ("python", "*.py"),
    ("rust", "*.rs"),
    ("javascript", "*.js"),
    ("typescript", "*.ts"),
    ("markdown", "*.md"),
    ("toml", "*.toml"),
    ("yaml", "*.yaml"),
    ("json", "*.json"),
    ("csv", "*.csv"),
    ("text", "*.txt"),
    ("log", "*.log"),
];

/// Executes Local route plans against the tool executor.
pub struct LocalDispatcher {
    tools: Arc<dyn ToolExecutorPort>,
}

impl LocalDispatcher {
    pub fn new(tools: Arc<dyn ToolExecutorPort>) -> Self {
        Self { tools }
    }

    /// Run the local collaborator for this route and draft a reply.
    pub async fn dispatch(&self, request: &Request, route_plan: &RoutePlan) -> Draft {
        let call = match self.build_call(request, route_plan) {
            Ok(call) => call,
            // No executable call for this text: answer with the canned or
            // clarifying reply directly.
            Err(reply) => return Draft::text(reply),
        };

        debug!(request = %request.id, tool = %call.tool_name, "Dispatching locally");

        let result = self.tools.execute(&call).await;
        let mut plan = ToolCallPlan::new();
        let text = match &result.outcome {
            Ok(output) => {
                plan.push(PlanStep::succeeded(
                    &call.tool_name,
                    call.arguments.clone(),
                    output,
                ));
                format_reply(route_plan.intent.kind, output)
            }
            Err(error) => {
                plan.push(PlanStep::failed(
                    &call.tool_name,
                    call.arguments.clone(),
                    error.to_string(),
                ));
                format!("I couldn't complete that: {error}")
            }
        };

        Draft {
            text: Some(text),
            plan,
            degraded: None,
        }
    }

    /// Map the routed intent onto a concrete tool call, deriving arguments
    /// from the request text. `Err` carries a direct reply instead.
    fn build_call(&self, request: &Request, route_plan: &RoutePlan) -> Result<ToolCall, String> {
        let input = RuleInput::new(&request.text);

        match route_plan.intent.kind {
            IntentKind::LocationQuery => Ok(ToolCall::new("current_location")),
            IntentKind::FileSearch => {
                Ok(ToolCall::new("find_files").with_arg("pattern", search_pattern(&input)))
            }
            IntentKind::FileRead => match input.filenames().first() {
                Some(path) => Ok(ToolCall::new("read_file").with_arg("path", *path)),
                None => Err("Which file would you like me to read?".to_string()),
            },
            IntentKind::ShellExecution => {
                Ok(ToolCall::new("run_command").with_arg("command", extract_command(&request.text)))
            }
            IntentKind::DataAnalysis => match input.filenames().first() {
                Some(path) => Ok(ToolCall::new("summarize_data").with_arg("path", *path)),
                None => Err("Which data file should I look at?".to_string()),
            },
            // Local Conversation only happens on the fallback-default route.
            IntentKind::Conversation | IntentKind::RemoteToolRequired => {
                if request.text.trim().is_empty() {
                    Err(EMPTY_INPUT_REPLY.to_string())
                } else {
                    Err(UNCLASSIFIED_REPLY.to_string())
                }
            }
        }
    }
}

/// Derive a glob pattern: a named file wins, then extension vocabulary,
/// then everything.
fn search_pattern(input: &RuleInput) -> String {
    if let Some(file) = input.filenames().first() {
        return (*file).to_string();
    }
    for (word, pattern) in EXTENSION_WORDS {
        if input.normalized().contains(word) {
            return (*pattern).to_string();
        }
    }
    "*".to_string()
}

/// Strip the imperative prefix off a shell request.
fn extract_command(text: &str) -> String {
    let trimmed = text.trim();
    for prefix in ["run ", "Run ", "execute ", "Execute ", "exec ", "$ ", "! "] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn format_reply(kind: IntentKind, output: &str) -> String {
    let output = output.trim();
    match kind {
        IntentKind::LocationQuery => format!("You're currently in {output}."),
        IntentKind::FileSearch => format!("Here's what I found:\n{output}"),
        IntentKind::ShellExecution => format!("Command output:\n{output}"),
        _ => output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tool_executor::ToolExecutorPort;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use switchboard_domain::{
        Intent, IntentKind, ToolDefinition, ToolError, ToolResult, ToolSpec, route,
    };

    struct RecordingTools {
        spec: ToolSpec,
        calls: Mutex<Vec<ToolCall>>,
        fail: bool,
    }

    impl RecordingTools {
        fn new() -> Self {
            let spec = ToolSpec::new()
                .register(ToolDefinition::new("current_location", "Working directory"))
                .register(ToolDefinition::new("find_files", "Find files by pattern"))
                .register(ToolDefinition::new("read_file", "Read a file"))
                .register(ToolDefinition::new("run_command", "Run a shell command"))
                .register(ToolDefinition::new("summarize_data", "Summarize a data file"));
            Self {
                spec,
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn last_call(&self) -> ToolCall {
            self.calls.lock().unwrap().last().unwrap().clone()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for RecordingTools {
        fn tool_spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            self.calls.lock().unwrap().push(call.clone());
            if self.fail {
                ToolResult::failure(&call.tool_name, ToolError::NotFound("nope".into()))
            } else {
                ToolResult::success(&call.tool_name, "/home/demo/project")
            }
        }
    }

    fn dispatch_setup() -> (LocalDispatcher, Arc<RecordingTools>) {
        let tools = Arc::new(RecordingTools::new());
        (LocalDispatcher::new(tools.clone()), tools)
    }

    #[tokio::test]
    async fn test_location_query() {
        let (dispatcher, tools) = dispatch_setup();
        let request = Request::new("r-1", "alice", "pwd");
        let plan = route(Intent::heuristic(IntentKind::LocationQuery));

        let draft = dispatcher.dispatch(&request, &plan).await;

        assert_eq!(tools.last_call().tool_name, "current_location");
        assert_eq!(draft.plan.len(), 1);
        assert!(draft.text.unwrap().contains("/home/demo/project"));
    }

    #[tokio::test]
    async fn test_file_search_pattern_from_extension_word() {
        let (dispatcher, tools) = dispatch_setup();
        let request = Request::new("r-1", "alice", "list the python files here");
        let plan = route(Intent::heuristic(IntentKind::FileSearch));

        dispatcher.dispatch(&request, &plan).await;

        let call = tools.last_call();
        assert_eq!(call.tool_name, "find_files");
        assert_eq!(call.get_string("pattern"), Some("*.py"));
    }

    #[tokio::test]
    async fn test_file_read_uses_named_file() {
        let (dispatcher, tools) = dispatch_setup();
        let request = Request::new("r-1", "alice", "open config.yaml");
        let plan = route(Intent::heuristic(IntentKind::FileRead));

        dispatcher.dispatch(&request, &plan).await;

        let call = tools.last_call();
        assert_eq!(call.tool_name, "read_file");
        assert_eq!(call.get_string("path"), Some("config.yaml"));
    }

    #[tokio::test]
    async fn test_file_read_without_filename_asks_back() {
        let (dispatcher, tools) = dispatch_setup();
        let request = Request::new("r-1", "alice", "read it to me");
        let plan = route(Intent::heuristic(IntentKind::FileRead));

        let draft = dispatcher.dispatch(&request, &plan).await;

        assert_eq!(tools.call_count(), 0);
        assert!(draft.text.unwrap().contains("Which file"));
    }

    #[tokio::test]
    async fn test_shell_command_prefix_stripped() {
        let (dispatcher, tools) = dispatch_setup();
        let request = Request::new("r-1", "alice", "run cargo fmt --check");
        let plan = route(Intent::heuristic(IntentKind::ShellExecution));

        dispatcher.dispatch(&request, &plan).await;

        let call = tools.last_call();
        assert_eq!(call.tool_name, "run_command");
        assert_eq!(call.get_string("command"), Some("cargo fmt --check"));
    }

    #[tokio::test]
    async fn test_empty_input_conversation() {
        let (dispatcher, tools) = dispatch_setup();
        let request = Request::new("r-1", "alice", "");
        let plan = route(Intent::fallback_default());

        let draft = dispatcher.dispatch(&request, &plan).await;

        assert_eq!(tools.call_count(), 0);
        assert!(draft.degraded.is_none());
        assert!(!draft.text.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_apology_text() {
        let tools = Arc::new(RecordingTools::failing());
        let dispatcher = LocalDispatcher::new(tools);
        let request = Request::new("r-1", "alice", "open config.yaml");
        let plan = route(Intent::heuristic(IntentKind::FileRead));

        let draft = dispatcher.dispatch(&request, &plan).await;

        assert_eq!(draft.plan.len(), 1);
        assert!(!draft.plan.steps()[0].outcome.is_ok());
        assert!(draft.text.unwrap().contains("couldn't complete"));
    }

    #[test]
    fn test_extract_command_variants() {
        assert_eq!(extract_command("run ls -la"), "ls -la");
        assert_eq!(extract_command("Execute echo hi"), "echo hi");
        assert_eq!(extract_command("du -sh ."), "du -sh .");
    }
}
