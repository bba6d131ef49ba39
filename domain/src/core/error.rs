//! Pipeline error taxonomy.
//!
//! Almost everything in the pipeline degrades instead of failing: a
//! [`DegradeReason`] travels with the response and the caller still gets
//! usable text. [`PipelineError`] is reserved for the two conditions that
//! genuinely cannot produce a response: malformed input at the boundary,
//! and caller-initiated cancellation.

use thiserror::Error;

/// Errors that propagate to the caller of the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request failed boundary validation (e.g. missing caller id).
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The caller cancelled or disconnected.
    #[error("Operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Why a response was produced in degraded form.
///
/// None of these surface as errors; they mark the `degraded` flag on the
/// result and are logged for the calling layer to annotate output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// A remote dependency's circuit breaker was open.
    DependencyUnavailable,
    /// The orchestration iteration or wall-clock budget ran out.
    BudgetExhausted,
    /// Admission was rejected by the concurrency governor.
    Overloaded,
}

impl DegradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradeReason::DependencyUnavailable => "dependency_unavailable",
            DegradeReason::BudgetExhausted => "budget_exhausted",
            DegradeReason::Overloaded => "overloaded",
        }
    }
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
