//! The append-only tool-call plan for one request.
//!
//! Steps are appended only after the previous tool call has returned or
//! errored; they are never reordered or removed. The plan doubles as the
//! per-request audit trail and as recovery material for the response
//! validator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of one executed tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum StepOutcome {
    Ok { output: String },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok { .. })
    }
}

/// One executed tool call: what was invoked, with what, and what came back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool_name: String,
    pub arguments: HashMap<String, serde_json::Value>,
    pub outcome: StepOutcome,
}

impl PlanStep {
    pub fn succeeded(
        tool_name: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            outcome: StepOutcome::Ok {
                output: output.into(),
            },
        }
    }

    pub fn failed(
        tool_name: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            outcome: StepOutcome::Failed {
                error: error.into(),
            },
        }
    }

    /// Whether a proposed call repeats this step exactly (cycle detection).
    pub fn same_invocation(
        &self,
        tool_name: &str,
        arguments: &HashMap<String, serde_json::Value>,
    ) -> bool {
        self.tool_name == tool_name && &self.arguments == arguments
    }

    /// One-line rendering for planning prompts and logs.
    pub fn describe(&self) -> String {
        match &self.outcome {
            StepOutcome::Ok { output } => format!("{}: ok: {}", self.tool_name, output),
            StepOutcome::Failed { error } => format!("{}: failed: {}", self.tool_name, error),
        }
    }
}

/// Append-only sequence of executed steps for one request.
///
/// The vector is private: the only mutation is [`push`](Self::push), which
/// preserves the audit-trail invariant by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallPlan {
    steps: Vec<PlanStep>,
}

impl ToolCallPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&PlanStep> {
        self.steps.last()
    }

    /// Most recent successful output, used by validator recovery.
    pub fn last_success(&self) -> Option<&PlanStep> {
        self.steps.iter().rev().find(|s| s.outcome.is_ok())
    }

    /// Distinct tool names invoked so far, in first-use order.
    pub fn distinct_tools(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for step in &self.steps {
            if !seen.contains(&step.tool_name.as_str()) {
                seen.push(step.tool_name.as_str());
            }
        }
        seen
    }
}
