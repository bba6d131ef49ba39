//! Layered response validation.
//!
//! Three ordered layers stand between a model draft and the caller:
//!
//! 1. **Recovery** — a missing or blank draft is rebuilt from the most
//!    recent successful tool output in the plan.
//! 2. **Scrub** — the draft is scanned for leaked planning payloads,
//!    deflections ("you can run ..."), emptiness, and suspicious brevity;
//!    failures are replaced with tool output or a generic acknowledgement.
//! 3. **Finalize** — one last emptiness/leak check that substitutes a fixed
//!    safe message. This layer cannot fail.
//!
//! Invariant at the boundary: returned text is never empty, never a verbatim
//! planning payload, and never asks the caller to perform an action the
//! system can do itself.

use crate::plan::ToolCallPlan;
use serde::{Deserialize, Serialize};

/// Why a layer rewrote the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairReason {
    MissingDraft,
    PlanLeak,
    Deflection,
    Empty,
    TooShort,
}

impl RepairReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairReason::MissingDraft => "missing_draft",
            RepairReason::PlanLeak => "plan_leak",
            RepairReason::Deflection => "deflection",
            RepairReason::Empty => "empty",
            RepairReason::TooShort => "too_short",
        }
    }
}

/// Verdict of a single inspection pass over one draft. Ephemeral: produced
/// and consumed inside the validator for one response.
#[derive(Debug, Clone)]
pub struct ValidationVerdict {
    pub ok: bool,
    pub reason: Option<RepairReason>,
    pub repaired_text: Option<String>,
}

impl ValidationVerdict {
    fn pass() -> Self {
        Self {
            ok: true,
            reason: None,
            repaired_text: None,
        }
    }

    fn repair(reason: RepairReason) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            repaired_text: None,
        }
    }
}

/// Final validated response handed back to the pipeline.
#[derive(Debug, Clone)]
pub struct ValidatedResponse {
    pub text: String,
    pub repaired: bool,
    pub reason: Option<RepairReason>,
}

/// The unconditional last-resort message. Kept short and free of anything
/// the scanners would flag.
pub const SAFE_FALLBACK: &str =
    "I ran into an issue while preparing a response — could you rephrase your request?";

/// Keys that mark a structured planning payload leaking into prose.
const PLAN_KEYS: &[&str] = &[
    "\"tool\"",
    "\"tool_name\"",
    "\"command\"",
    "\"arguments\"",
    "\"action\"",
    "'tool_name'",
    "'command'",
    "'arguments'",
];

/// Phrases that deflect work back to the caller.
const DEFLECTIONS: &[&str] = &[
    "you can run",
    "you could run",
    "please run",
    "try running",
    "run the following",
    "you can execute",
    "paste the output",
    "share the output",
    "copy the output",
    "let me know the output",
];

fn contains_plan_leak(text: &str) -> bool {
    text.contains('{') && PLAN_KEYS.iter().any(|key| text.contains(key))
}

fn is_deflection(text: &str) -> bool {
    let lowered = text.to_lowercase();
    DEFLECTIONS.iter().any(|phrase| lowered.contains(phrase))
}

/// Layered output-safety gate.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    /// Below this many characters, a reply to a non-trivial query is
    /// considered truncated.
    min_substantive_len: usize,
    /// Word count above which a query counts as non-trivial.
    nontrivial_query_words: usize,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self {
            min_substantive_len: 20,
            nontrivial_query_words: 8,
        }
    }
}

impl ResponseValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all three layers. Never fails; always returns non-empty text.
    pub fn validate(
        &self,
        raw: Option<&str>,
        plan: &ToolCallPlan,
        request_text: &str,
    ) -> ValidatedResponse {
        // Layer 1: recover a missing or blank draft from the plan.
        let (draft, recovery_reason) = self.recover(raw, plan);

        // Layer 2: scan and substitute.
        let verdict = self.inspect(&draft, request_text);
        let (scrubbed, scrub_reason) = match verdict {
            ValidationVerdict { ok: true, .. } => (draft, None),
            ValidationVerdict {
                reason,
                repaired_text,
                ..
            } => (
                repaired_text.unwrap_or_else(|| self.acknowledgement(plan)),
                reason,
            ),
        };

        // Layer 3: unconditional guarantee.
        let text = Self::finalize(&scrubbed);
        let finalized = text != scrubbed.trim();

        let reason = recovery_reason.or(scrub_reason).or_else(|| {
            finalized.then_some(RepairReason::Empty)
        });

        ValidatedResponse {
            repaired: reason.is_some(),
            reason,
            text,
        }
    }

    /// Layer 1: if the raw result is missing or blank, rebuild from the most
    /// recent successful tool output.
    fn recover(&self, raw: Option<&str>, plan: &ToolCallPlan) -> (String, Option<RepairReason>) {
        match raw {
            Some(text) if !text.trim().is_empty() => (text.to_string(), None),
            _ => (
                self.recovered_from_plan(plan)
                    .unwrap_or_default(),
                Some(RepairReason::MissingDraft),
            ),
        }
    }

    /// Layer 2 detection. Exposed separately so each check is testable.
    pub fn inspect(&self, text: &str, request_text: &str) -> ValidationVerdict {
        if text.trim().is_empty() {
            return ValidationVerdict::repair(RepairReason::Empty);
        }
        if contains_plan_leak(text) {
            return ValidationVerdict::repair(RepairReason::PlanLeak);
        }
        if is_deflection(text) {
            return ValidationVerdict::repair(RepairReason::Deflection);
        }
        let query_words = request_text.split_whitespace().count();
        if query_words >= self.nontrivial_query_words && text.trim().len() < self.min_substantive_len
        {
            return ValidationVerdict::repair(RepairReason::TooShort);
        }
        ValidationVerdict::pass()
    }

    /// Layer 3: re-check emptiness and leaks one final time. Infallible.
    pub fn finalize(text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() || contains_plan_leak(trimmed) {
            SAFE_FALLBACK.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Prefer real tool output for substitutions, provided it would not
    /// itself trip the scanners.
    fn recovered_from_plan(&self, plan: &ToolCallPlan) -> Option<String> {
        let step = plan.last_success()?;
        let output = match &step.outcome {
            crate::plan::StepOutcome::Ok { output } => output,
            crate::plan::StepOutcome::Failed { .. } => return None,
        };
        if output.trim().is_empty() || contains_plan_leak(output) {
            return None;
        }
        Some(format!("Here's what I found: {}", output.trim()))
    }

    /// Generic acknowledgement of work done when no tool output is usable.
    fn acknowledgement(&self, plan: &ToolCallPlan) -> String {
        if let Some(recovered) = self.recovered_from_plan(plan) {
            return recovered;
        }
        if plan.is_empty() {
            SAFE_FALLBACK.to_string()
        } else {
            format!(
                "I carried out {} step(s) ({}) but couldn't compose a full summary of the result.",
                plan.len(),
                plan.distinct_tools().join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanStep;
    use std::collections::HashMap;

    fn plan_with_success(output: &str) -> ToolCallPlan {
        let mut plan = ToolCallPlan::new();
        plan.push(PlanStep::succeeded("find_files", HashMap::new(), output));
        plan
    }

    // ==================== Detection ====================

    #[test]
    fn test_plan_leak_detected() {
        assert!(contains_plan_leak(r#"{"command": "ls -la"}"#));
        assert!(contains_plan_leak(
            r#"Sure! {"tool_name": "find_files", "arguments": {}}"#
        ));
        assert!(!contains_plan_leak("The files are a.rs and b.rs"));
        // Braces without planning keys are honest prose (e.g. code snippets)
        assert!(!contains_plan_leak("In Rust, blocks use { and }"));
    }

    #[test]
    fn test_deflection_detected() {
        assert!(is_deflection("You can run `ls` and paste the output here."));
        assert!(is_deflection("Please run this command yourself"));
        assert!(!is_deflection("I ran the command; here are the results."));
    }

    // ==================== Layers ====================

    #[test]
    fn test_missing_draft_recovers_from_plan() {
        let validator = ResponseValidator::new();
        let plan = plan_with_success("a.rs, b.rs");

        let result = validator.validate(None, &plan, "list the rust files");
        assert!(result.repaired);
        assert_eq!(result.reason, Some(RepairReason::MissingDraft));
        assert!(result.text.contains("a.rs, b.rs"));
    }

    #[test]
    fn test_empty_input_yields_non_empty_output() {
        let validator = ResponseValidator::new();
        let plan = ToolCallPlan::new();

        for raw in [None, Some(""), Some("   \n  ")] {
            let result = validator.validate(raw, &plan, "anything");
            assert!(!result.text.trim().is_empty());
            assert!(result.repaired);
        }
    }

    #[test]
    fn test_leak_never_survives() {
        let validator = ResponseValidator::new();
        let plan = plan_with_success("42 files");

        let raw = r#"{"tool_name": "find_files", "arguments": {"pattern": "*.py"}}"#;
        let result = validator.validate(Some(raw), &plan, "list the python files here");

        assert!(!result.text.contains("\"tool_name\""));
        assert!(result.repaired);
        assert_eq!(result.reason, Some(RepairReason::PlanLeak));
        // Substitution preferred tool output over the generic message
        assert!(result.text.contains("42 files"));
    }

    #[test]
    fn test_leak_with_no_usable_plan_gets_generic_message() {
        let validator = ResponseValidator::new();
        let plan = ToolCallPlan::new();

        let raw = r#"{"command": "rm -rf /"}"#;
        let result = validator.validate(Some(raw), &plan, "clean up");

        assert_eq!(result.text, SAFE_FALLBACK);
    }

    #[test]
    fn test_deflection_substituted() {
        let validator = ResponseValidator::new();
        let plan = plan_with_success("total 12K used");

        let raw = "You can run `du -sh` yourself and paste the output.";
        let result = validator.validate(Some(raw), &plan, "how much disk space is used here");

        assert_eq!(result.reason, Some(RepairReason::Deflection));
        assert!(result.text.contains("total 12K used"));
    }

    #[test]
    fn test_short_reply_to_nontrivial_query_repaired() {
        let validator = ResponseValidator::new();
        let plan = plan_with_success("Apple: 391B, Microsoft: 245B");

        let result = validator.validate(
            Some("ok"),
            &plan,
            "compare the annual revenue of Apple and Microsoft for last year",
        );
        assert_eq!(result.reason, Some(RepairReason::TooShort));
        assert!(result.text.contains("391B"));
    }

    #[test]
    fn test_short_reply_to_trivial_query_passes() {
        let validator = ResponseValidator::new();
        let result = validator.validate(Some("Hello!"), &ToolCallPlan::new(), "hi");
        assert!(!result.repaired);
        assert_eq!(result.text, "Hello!");
    }

    #[test]
    fn test_clean_draft_untouched() {
        let validator = ResponseValidator::new();
        let text = "There are three Python files here: a.py, b.py and c.py.";
        let result = validator.validate(Some(text), &ToolCallPlan::new(), "list the python files");
        assert!(!result.repaired);
        assert_eq!(result.text, text);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        for input in ["", "   ", r#"{"command": "x"}"#, "A normal sentence.", SAFE_FALLBACK] {
            let once = ResponseValidator::finalize(input);
            let twice = ResponseValidator::finalize(&once);
            assert_eq!(once, twice);
            assert!(!once.trim().is_empty());
        }
    }

    #[test]
    fn test_recovery_skips_leaky_tool_output() {
        let validator = ResponseValidator::new();
        let plan = plan_with_success(r#"{"command": "internal"}"#);

        let result = validator.validate(None, &plan, "do the thing");
        // The leaky tool output must not be promoted into the reply.
        assert!(!result.text.contains("internal"));
        assert!(!result.text.trim().is_empty());
    }
}
