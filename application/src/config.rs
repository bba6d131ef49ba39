//! Pipeline parameters — static knobs for the request pipeline.
//!
//! [`PipelineParams`] groups admission caps, timeouts and budgets consumed
//! by the classifier, governor and orchestrator. These are application-layer
//! concerns; the file-configuration adapter in the infrastructure layer maps
//! its sections onto this struct.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Static pipeline control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Global in-flight cap over all remote-mode requests.
    pub global_capacity: usize,
    /// In-flight cap per caller.
    pub per_caller_capacity: usize,
    /// Timeout for the classifier's remote fallback call.
    pub classify_timeout: Duration,
    /// Words kept of very long text before a remote classification call.
    pub classify_max_words: usize,
    /// Classification cache time-to-live.
    pub cache_ttl: Duration,
    /// Classification cache entry bound.
    pub cache_capacity: usize,
    /// Maximum orchestration iterations (planning calls) per request.
    pub max_iterations: usize,
    /// Wall-clock budget for one whole orchestration.
    pub orchestration_budget: Duration,
    /// Timeout for a single planning call.
    pub planning_timeout: Duration,
    /// Prior turns included in planning and classification prompts.
    pub context_turns: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            global_capacity: 50,
            per_caller_capacity: 3,
            classify_timeout: Duration::from_secs(2),
            classify_max_words: 120,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1024,
            max_iterations: 5,
            orchestration_budget: Duration::from_secs(30),
            planning_timeout: Duration::from_secs(10),
            context_turns: 10,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_global_capacity(mut self, cap: usize) -> Self {
        self.global_capacity = cap;
        self
    }

    pub fn with_per_caller_capacity(mut self, cap: usize) -> Self {
        self.per_caller_capacity = cap;
        self
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_orchestration_budget(mut self, budget: Duration) -> Self {
        self.orchestration_budget = budget;
        self
    }
}
