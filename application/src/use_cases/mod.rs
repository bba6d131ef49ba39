//! Pipeline use cases.

pub mod local_dispatch;
pub mod orchestrate;
pub mod process_request;

use switchboard_domain::{DegradeReason, PipelineError, ToolCallPlan};
use tokio_util::sync::CancellationToken;

/// A draft response on its way to the validator: possibly-absent text, the
/// audit-trail plan behind it, and the degradation cause if any.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: Option<String>,
    pub plan: ToolCallPlan,
    pub degraded: Option<DegradeReason>,
}

impl Draft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn degraded(reason: DegradeReason, text: Option<String>, plan: ToolCallPlan) -> Self {
        Self {
            text,
            plan,
            degraded: Some(reason),
        }
    }
}

/// Check if the operation was cancelled via the optional token.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), PipelineError> {
    match token {
        Some(token) if token.is_cancelled() => Err(PipelineError::Cancelled),
        _ => Ok(()),
    }
}
