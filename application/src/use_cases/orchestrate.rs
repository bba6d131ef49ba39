//! Multi-step tool orchestration.
//!
//! A state machine over the append-only [`ToolCallPlan`]: each iteration
//! composes a planning prompt from the request, conversation context and the
//! steps so far, asks the model (through the breaker) whether a tool call is
//! needed, executes it, and loops. Stops on a text answer, the iteration or
//! wall-clock budget, or two consecutive identical tool requests.
//!
//! Open-ended "do you need more tools?" re-prompts are the documented
//! premature-stopping failure mode, so when the request carries a second
//! action keyword the next planning call names the follow-up tool to invoke
//! instead of asking.
//!
//! A failed tool call becomes a failed step fed back to the planner; only a
//! breaker-open on the planning call itself aborts early, with a degraded
//! draft built from whatever the plan already holds.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_domain::{
    DegradeReason, PipelineError, PlanStep, Request, RoutePlan, StepOutcome, ToolCallPlan,
    ToolSpec, normalize,
};

use crate::config::PipelineParams;
use crate::ports::model_gateway::{ModelGatewayPort, ModelReply};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::resilience::{CircuitBreaker, GuardedCall};
use crate::use_cases::{Draft, check_cancelled};

/// Action keywords scanned for multi-clause requests, e.g.
/// "load sales.csv then plot revenue" carries `load` and `plot`.
const ACTION_KEYWORDS: &[&str] = &[
    "load", "read", "fetch", "download", "search", "find", "get", "look", "plot", "chart",
    "graph", "compare", "analyze", "analyse", "summarize", "summarise", "convert", "save",
    "write", "rank",
];

/// Hint that the request asks for a second, distinct action.
#[derive(Debug, Clone)]
struct FollowupDirective {
    keyword: String,
    tool_name: Option<String>,
}

fn detect_followup(text: &str, spec: &ToolSpec) -> Option<FollowupDirective> {
    let normalized = normalize(text);
    let mut found: Vec<&str> = Vec::new();
    for token in normalized.split(|c: char| !c.is_ascii_alphanumeric()) {
        if ACTION_KEYWORDS.contains(&token) && !found.contains(&token) {
            found.push(token);
        }
    }
    if found.len() < 2 {
        return None;
    }

    let keyword = found[1];
    let tool_name = spec
        .all()
        .iter()
        .find(|tool| {
            tool.name.contains(keyword) || tool.description.to_lowercase().contains(keyword)
        })
        .map(|tool| tool.name.clone());

    Some(FollowupDirective {
        keyword: keyword.to_string(),
        tool_name,
    })
}

/// Orchestrates planning and tool execution for one remote-mode request.
pub struct ToolOrchestrator {
    gateway: Arc<dyn ModelGatewayPort>,
    tools: Arc<dyn ToolExecutorPort>,
    breaker: Arc<CircuitBreaker>,
    params: PipelineParams,
    cancellation: Option<CancellationToken>,
}

impl ToolOrchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGatewayPort>,
        tools: Arc<dyn ToolExecutorPort>,
        breaker: Arc<CircuitBreaker>,
        params: PipelineParams,
    ) -> Self {
        Self {
            gateway,
            tools,
            breaker,
            params,
            cancellation: None,
        }
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Run the orchestration loop until a draft is ready.
    pub async fn run(
        &self,
        request: &Request,
        route_plan: &RoutePlan,
    ) -> Result<Draft, PipelineError> {
        let mut plan = ToolCallPlan::new();
        let followup = detect_followup(&request.text, self.tools.tool_spec());
        let started = Instant::now();
        let mut iterations = 0usize;

        info!(
            request = %request.id,
            intent = %route_plan.intent,
            followup = followup.is_some(),
            "Starting orchestration"
        );

        loop {
            check_cancelled(&self.cancellation)?;

            if iterations >= self.params.max_iterations
                || started.elapsed() >= self.params.orchestration_budget
            {
                info!(
                    request = %request.id,
                    iterations,
                    steps = plan.len(),
                    "Orchestration budget exhausted"
                );
                let text = synthesize_draft(&plan);
                return Ok(Draft::degraded(DegradeReason::BudgetExhausted, text, plan));
            }

            let prompt = self.planning_prompt(request, &plan, followup.as_ref());
            iterations += 1;

            let reply = match self
                .breaker
                .call(
                    self.params.planning_timeout,
                    self.gateway.complete(&prompt, Some(self.tools.tool_spec().all())),
                )
                .await
            {
                Ok(reply) => reply,
                Err(GuardedCall::Open(error)) => {
                    warn!(%error, request = %request.id, "Planning aborted, breaker open");
                    let text = synthesize_draft(&plan);
                    return Ok(Draft::degraded(
                        DegradeReason::DependencyUnavailable,
                        text,
                        plan,
                    ));
                }
                Err(error) => {
                    // Transient planning failure: burn the iteration and let
                    // the budget decide when to give up.
                    warn!(%error, request = %request.id, iteration = iterations, "Planning call failed");
                    continue;
                }
            };

            match reply {
                ModelReply::Text(text) => {
                    debug!(request = %request.id, steps = plan.len(), "Planner finished with text");
                    return Ok(Draft {
                        text: Some(text),
                        plan,
                        degraded: None,
                    });
                }
                ModelReply::ToolCall(call) => {
                    let repeated = plan
                        .last()
                        .is_some_and(|step| step.same_invocation(&call.tool_name, &call.arguments));
                    if repeated {
                        info!(
                            request = %request.id,
                            tool = %call.tool_name,
                            "Cycle detected, synthesizing from plan"
                        );
                        let text = synthesize_draft(&plan);
                        return Ok(Draft {
                            text,
                            plan,
                            degraded: None,
                        });
                    }

                    let result = self.tools.execute(&call).await;
                    let step = match &result.outcome {
                        Ok(output) => {
                            PlanStep::succeeded(&call.tool_name, call.arguments.clone(), output)
                        }
                        Err(error) => {
                            warn!(
                                request = %request.id,
                                tool = %call.tool_name,
                                %error,
                                "Tool call failed, feeding back to planner"
                            );
                            PlanStep::failed(
                                &call.tool_name,
                                call.arguments.clone(),
                                error.to_string(),
                            )
                        }
                    };
                    plan.push(step);
                }
            }
        }
    }

    /// Compose the planning prompt for the next iteration.
    fn planning_prompt(
        &self,
        request: &Request,
        plan: &ToolCallPlan,
        followup: Option<&FollowupDirective>,
    ) -> String {
        let mut prompt = String::new();

        let recent = request
            .context
            .len()
            .saturating_sub(self.params.context_turns);
        for turn in &request.context[recent..] {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.text));
        }

        prompt.push_str(&format!("Request: {}\n", request.text));

        if !plan.is_empty() {
            prompt.push_str("Steps completed so far:\n");
            for (index, step) in plan.steps().iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", index + 1, step.describe()));
            }
        }

        match followup {
            Some(directive)
                if plan.last_success().is_some() && !self.followup_done(plan, directive) =>
            {
                // Name the next tool outright; an open-ended re-prompt is
                // what makes planners stop after the first step.
                match &directive.tool_name {
                    Some(tool) => prompt.push_str(&format!(
                        "The request also asks to {}. Call the '{}' tool next to complete it.\n",
                        directive.keyword, tool
                    )),
                    None => prompt.push_str(&format!(
                        "The request also asks to {}. Call the tool that covers that next.\n",
                        directive.keyword
                    )),
                }
            }
            _ => {
                prompt.push_str(
                    "If another tool call is needed to complete the request, call it; \
                     otherwise answer the user directly.\n",
                );
            }
        }

        prompt
    }

    fn followup_done(&self, plan: &ToolCallPlan, directive: &FollowupDirective) -> bool {
        match &directive.tool_name {
            Some(tool) => plan.steps().iter().any(|step| &step.tool_name == tool),
            None => false,
        }
    }
}

/// Best-effort summary of the accumulated plan for degraded or cycle stops.
fn synthesize_draft(plan: &ToolCallPlan) -> Option<String> {
    let findings: Vec<String> = plan
        .steps()
        .iter()
        .filter_map(|step| match &step.outcome {
            StepOutcome::Ok { output } => {
                Some(format!("- {}: {}", step.tool_name, output.trim()))
            }
            StepOutcome::Failed { .. } => None,
        })
        .collect();

    if findings.is_empty() {
        None
    } else {
        Some(format!("Here's what I found so far:\n{}", findings.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_gateway::GatewayError;
    use crate::resilience::BreakerConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use switchboard_domain::{
        Intent, IntentKind, ToolCall, ToolDefinition, ToolError, ToolResult, route,
    };

    /// Gateway returning scripted replies and recording every prompt.
    struct ScriptedPlanner {
        replies: Mutex<Vec<Result<ModelReply, GatewayError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedPlanner {
        fn new(replies: Vec<Result<ModelReply, GatewayError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelGatewayPort for ScriptedPlanner {
        async fn complete(
            &self,
            prompt: &str,
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ModelReply, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Ok(ModelReply::Text("(no more scripted replies)".to_string()));
            }
            replies.remove(0)
        }
    }

    /// Executor with two remote tool families; fails tools listed in `failing`.
    struct FakeTools {
        spec: ToolSpec,
        failing: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTools {
        fn new() -> Self {
            let spec = ToolSpec::new()
                .register(ToolDefinition::new(
                    "load_dataset",
                    "Load a dataset from a file or URL",
                ))
                .register(ToolDefinition::new(
                    "plot_series",
                    "Plot a numeric series from a loaded dataset",
                ))
                .register(ToolDefinition::new(
                    "financial_data",
                    "Fetch financial metrics for a company",
                ));
            Self {
                spec,
                failing: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, tool: &str) -> Self {
            self.failing.push(tool.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for FakeTools {
        fn tool_spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            self.calls.lock().unwrap().push(call.tool_name.clone());
            if self.failing.contains(&call.tool_name) {
                ToolResult::failure(
                    &call.tool_name,
                    ToolError::ExecutionFailed("backend offline".into()),
                )
            } else {
                ToolResult::success(&call.tool_name, format!("{} ok", call.tool_name))
            }
        }
    }

    fn tool_call(name: &str, args: &[(&str, &str)]) -> ModelReply {
        let mut call = ToolCall::new(name);
        for (key, value) in args {
            call = call.with_arg(*key, *value);
        }
        ModelReply::ToolCall(call)
    }

    fn orchestrator(
        gateway: Arc<ScriptedPlanner>,
        tools: Arc<FakeTools>,
        breaker: Arc<CircuitBreaker>,
    ) -> ToolOrchestrator {
        ToolOrchestrator::new(
            gateway,
            tools,
            breaker,
            PipelineParams::default().with_max_iterations(5),
        )
    }

    fn remote_request(text: &str) -> (Request, RoutePlan) {
        let request = Request::new("r-1", "alice", text);
        let plan = route(Intent::heuristic(IntentKind::RemoteToolRequired));
        (request, plan)
    }

    fn args_map(pairs: &[(&str, &str)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
            .collect()
    }

    // ==================== Multi-step behavior ====================

    #[tokio::test]
    async fn test_two_clause_request_runs_two_tools() {
        let gateway = Arc::new(ScriptedPlanner::new(vec![
            Ok(tool_call("load_dataset", &[("path", "sales.csv")])),
            Ok(tool_call("plot_series", &[("column", "revenue")])),
            Ok(ModelReply::Text("Loaded sales.csv and plotted revenue.".into())),
        ]));
        let tools = Arc::new(FakeTools::new());
        let breaker = Arc::new(CircuitBreaker::with_defaults("model"));
        let orchestrator = orchestrator(gateway.clone(), tools.clone(), breaker);

        let (request, route_plan) = remote_request("load sales.csv and plot the revenue column");
        let draft = orchestrator.run(&request, &route_plan).await.unwrap();

        assert!(draft.degraded.is_none());
        assert_eq!(draft.plan.len(), 2);
        assert_eq!(draft.plan.distinct_tools(), ["load_dataset", "plot_series"]);
        assert_eq!(tools.calls(), ["load_dataset", "plot_series"]);

        // The second planning prompt names the follow-up tool explicitly
        // rather than re-asking open-endedly.
        let prompts = gateway.prompts();
        assert!(prompts[1].contains("plot_series"));
        assert!(prompts[1].contains("also asks to plot"));
    }

    #[tokio::test]
    async fn test_single_clause_request_gets_open_prompt() {
        let gateway = Arc::new(ScriptedPlanner::new(vec![Ok(ModelReply::Text(
            "Nothing to do.".into(),
        ))]));
        let tools = Arc::new(FakeTools::new());
        let breaker = Arc::new(CircuitBreaker::with_defaults("model"));
        let orchestrator = orchestrator(gateway.clone(), tools, breaker);

        let (request, route_plan) = remote_request("what's new with you");
        orchestrator.run(&request, &route_plan).await.unwrap();

        let prompts = gateway.prompts();
        assert!(prompts[0].contains("otherwise answer the user directly"));
    }

    // ==================== Stop conditions ====================

    #[tokio::test]
    async fn test_cycle_detection_stops_loop() {
        let same = || tool_call("financial_data", &[("company", "apple")]);
        let gateway = Arc::new(ScriptedPlanner::new(vec![Ok(same()), Ok(same()), Ok(same())]));
        let tools = Arc::new(FakeTools::new());
        let breaker = Arc::new(CircuitBreaker::with_defaults("model"));
        let orchestrator = orchestrator(gateway, tools.clone(), breaker);

        let (request, route_plan) = remote_request("apple revenue please");
        let draft = orchestrator.run(&request, &route_plan).await.unwrap();

        // The repeated invocation was not executed a second time
        assert_eq!(tools.calls().len(), 1);
        assert_eq!(draft.plan.len(), 1);
        assert!(draft.degraded.is_none());
        assert!(draft.text.unwrap().contains("financial_data"));
    }

    #[tokio::test]
    async fn test_iteration_budget_degrades() {
        // Planner keeps asking for new, distinct tool calls forever.
        let replies = (0..10)
            .map(|i| {
                let call = ToolCall::new("financial_data").with_arg("company", format!("c{i}"));
                Ok(ModelReply::ToolCall(call))
            })
            .collect();
        let gateway = Arc::new(ScriptedPlanner::new(replies));
        let tools = Arc::new(FakeTools::new());
        let breaker = Arc::new(CircuitBreaker::with_defaults("model"));
        let orchestrator = ToolOrchestrator::new(
            gateway,
            tools,
            breaker,
            PipelineParams::default().with_max_iterations(3),
        );

        let (request, route_plan) = remote_request("compare everything");
        let draft = orchestrator.run(&request, &route_plan).await.unwrap();

        assert_eq!(draft.degraded, Some(DegradeReason::BudgetExhausted));
        assert_eq!(draft.plan.len(), 3);
        // Best-effort text still synthesized from the plan
        assert!(draft.text.unwrap().contains("financial_data"));
    }

    #[tokio::test]
    async fn test_breaker_open_aborts_with_degraded_draft() {
        let gateway = Arc::new(ScriptedPlanner::new(vec![]));
        let tools = Arc::new(FakeTools::new());
        let breaker = Arc::new(CircuitBreaker::with_defaults("model"));
        breaker.force_open();
        let orchestrator = orchestrator(gateway.clone(), tools, breaker);

        let (request, route_plan) = remote_request("apple revenue please");
        let draft = orchestrator.run(&request, &route_plan).await.unwrap();

        assert_eq!(draft.degraded, Some(DegradeReason::DependencyUnavailable));
        assert!(draft.plan.is_empty());
        // The dependency was never touched
        assert!(gateway.prompts().is_empty());
    }

    // ==================== Failure feedback ====================

    #[tokio::test]
    async fn test_tool_failure_recorded_and_fed_back() {
        let gateway = Arc::new(ScriptedPlanner::new(vec![
            Ok(tool_call("load_dataset", &[("path", "missing.csv")])),
            Ok(ModelReply::Text("The dataset could not be loaded.".into())),
        ]));
        let tools = Arc::new(FakeTools::new().failing("load_dataset"));
        let breaker = Arc::new(CircuitBreaker::with_defaults("model"));
        let orchestrator = orchestrator(gateway.clone(), tools, breaker);

        let (request, route_plan) = remote_request("load missing.csv");
        let draft = orchestrator.run(&request, &route_plan).await.unwrap();

        // The failure is a recorded step, not an abort
        assert!(draft.degraded.is_none());
        assert_eq!(draft.plan.len(), 1);
        assert!(!draft.plan.steps()[0].outcome.is_ok());

        // And the planner saw it on the next iteration
        let prompts = gateway.prompts();
        assert!(prompts[1].contains("failed"));
        assert!(prompts[1].contains("backend offline"));
    }

    // ==================== Followup detection ====================

    #[test]
    fn test_detect_followup_two_clauses() {
        let tools = FakeTools::new();
        let directive = detect_followup("load sales.csv then plot revenue", &tools.spec).unwrap();
        assert_eq!(directive.keyword, "plot");
        assert_eq!(directive.tool_name.as_deref(), Some("plot_series"));
    }

    #[test]
    fn test_detect_followup_single_clause() {
        let tools = FakeTools::new();
        assert!(detect_followup("plot the revenue", &tools.spec).is_none());
        assert!(detect_followup("hello there", &tools.spec).is_none());
    }

    #[test]
    fn test_cycle_comparison_helpers() {
        let step = PlanStep::succeeded("search", args_map(&[("q", "a")]), "out");
        assert!(step.same_invocation("search", &args_map(&[("q", "a")])));
    }
}
