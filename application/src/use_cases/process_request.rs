//! The request processing pipeline entry point.
//!
//! `Request → Cache/Classifier → Router → {Local | Governor→Breaker→Orchestrator}
//! → ResponseValidator → PipelineResult`.
//!
//! Only malformed boundary input (and caller cancellation) surfaces as an
//! error; dependency failures, admission rejection and budget exhaustion all
//! degrade to a safe, non-empty response with `degraded = true`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_domain::{
    DegradeReason, ExecutionMode, Intent, PipelineError, Request, ResponseValidator, ToolCallPlan,
    Turn, route,
};

use crate::classifier::Classifier;
use crate::ports::conversation_store::ConversationStorePort;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::resilience::ConcurrencyGovernor;
use crate::use_cases::local_dispatch::LocalDispatcher;
use crate::use_cases::orchestrate::ToolOrchestrator;
use crate::use_cases::{Draft, check_cancelled};

/// Reply for admission rejections: the caller is told to retry, never
/// silently queued.
const OVERLOADED_REPLY: &str =
    "I'm handling a lot of requests at the moment — please try again in a few seconds.";

/// What the pipeline hands back to the calling layer.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Validated, never-empty response text.
    pub text: String,
    /// The classification that drove routing.
    pub intent: Intent,
    /// Tool-call steps recorded for this request.
    pub tool_calls_made: usize,
    /// True when the breaker was open, the budget ran out, or admission was
    /// rejected; lets callers annotate output without knowing why.
    pub degraded: bool,
}

/// Use case wiring the full pipeline for one request at a time.
pub struct ProcessRequestUseCase {
    classifier: Arc<Classifier>,
    local: LocalDispatcher,
    orchestrator: ToolOrchestrator,
    governor: Arc<ConcurrencyGovernor>,
    store: Arc<dyn ConversationStorePort>,
    validator: ResponseValidator,
    cancellation: Option<CancellationToken>,
}

impl ProcessRequestUseCase {
    pub fn new(
        classifier: Arc<Classifier>,
        orchestrator: ToolOrchestrator,
        tools: Arc<dyn ToolExecutorPort>,
        governor: Arc<ConcurrencyGovernor>,
        store: Arc<dyn ConversationStorePort>,
    ) -> Self {
        Self {
            classifier,
            local: LocalDispatcher::new(tools),
            orchestrator,
            governor,
            store,
            validator: ResponseValidator::new(),
            cancellation: None,
        }
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.orchestrator = self.orchestrator.with_cancellation(token.clone());
        self.cancellation = Some(token);
        self
    }

    /// Process one request end to end.
    pub async fn process(&self, request: Request) -> Result<PipelineResult, PipelineError> {
        if !request.has_valid_caller() {
            return Err(PipelineError::MalformedRequest(
                "caller_id must not be empty".to_string(),
            ));
        }
        check_cancelled(&self.cancellation)?;

        // Context is read once, before classification.
        let request = if request.context.is_empty() {
            let context = self.store.context(&request.caller_id).await;
            request.with_context(context)
        } else {
            request
        };

        let intent = self.classifier.classify(&request.text, &request.context).await;
        let route_plan = route(intent);
        info!(
            request = %request.id,
            caller = %request.caller_id,
            %intent,
            mode = %route_plan.mode,
            "Request routed"
        );

        check_cancelled(&self.cancellation)?;

        let draft = match route_plan.mode {
            ExecutionMode::Local => self.local.dispatch(&request, &route_plan).await,
            ExecutionMode::Remote => match self.governor.admit(&request.caller_id) {
                Ok(_permit) => {
                    // Permit held for the whole remote dispatch; released by
                    // drop on every exit path, including `?` on cancel.
                    self.orchestrator.run(&request, &route_plan).await?
                }
                Err(error) => {
                    warn!(caller = %request.caller_id, %error, "Admission rejected");
                    Draft::degraded(
                        DegradeReason::Overloaded,
                        Some(OVERLOADED_REPLY.to_string()),
                        ToolCallPlan::new(),
                    )
                }
            },
        };

        let validated = self
            .validator
            .validate(draft.text.as_deref(), &draft.plan, &request.text);
        if validated.repaired {
            debug!(
                request = %request.id,
                reason = ?validated.reason,
                "Response repaired by validator"
            );
        }

        self.store
            .append(&request.caller_id, Turn::user(request.text.clone()))
            .await;
        self.store
            .append(&request.caller_id, Turn::assistant(validated.text.clone()))
            .await;

        Ok(PipelineResult {
            text: validated.text,
            intent,
            tool_calls_made: draft.plan.len(),
            degraded: draft.degraded.is_some(),
        })
    }
}
