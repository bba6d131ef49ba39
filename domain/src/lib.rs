//! Domain layer for switchboard
//!
//! This crate contains the pipeline's core types and pure logic. It has no
//! dependencies on infrastructure or presentation concerns and performs no
//! I/O.
//!
//! # Core Concepts
//!
//! ## Local / Remote split
//!
//! Every request is classified into an [`Intent`] and routed to exactly one
//! execution path. Local paths run in-process against local collaborators and
//! are never gated on remote-dependency health; Remote paths go through the
//! concurrency governor and circuit breakers in the application layer.
//!
//! ## Degradation over failure
//!
//! Apart from malformed boundary input, nothing in the pipeline surfaces an
//! error to the caller: classification falls back to a safe default, remote
//! failures produce degraded drafts, and the layered response validator
//! guarantees non-empty, leak-free output.

pub mod core;
pub mod intent;
pub mod plan;
pub mod request;
pub mod routing;
pub mod tool;
pub mod validation;

// Re-export commonly used types
pub use crate::core::error::{DegradeReason, PipelineError};
pub use crate::core::string::{fingerprint, normalize, truncate, truncate_words};
pub use intent::{
    Intent, IntentKind, IntentSource,
    rules::{Confidence, HeuristicRule, RuleInput, RuleMatch, RuleVerdict, evaluate_rules,
        heuristic_intent},
};
pub use plan::{PlanStep, StepOutcome, ToolCallPlan};
pub use request::{Request, Turn, TurnRole};
pub use routing::{ExecutionMode, RoutePlan, route};
pub use tool::{
    ToolCall, ToolDefinition, ToolError, ToolMetadata, ToolParameter, ToolResult, ToolSpec,
};
pub use validation::{
    RepairReason, ResponseValidator, SAFE_FALLBACK, ValidatedResponse, ValidationVerdict,
};
