//! Intent → execution path routing.
//!
//! [`route`] is a pure total function: every intent has a defined route and
//! there is no error case. The Local/Remote split is the pipeline's central
//! invariant — local operations must never be blocked by remote-dependency
//! health, so Local routes bypass the concurrency governor and the circuit
//! breakers entirely.

use crate::intent::{Intent, IntentKind, IntentSource};
use serde::{Deserialize, Serialize};

/// Where a request executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// In-process against local collaborators; no governor slot, no breaker.
    Local,
    /// Requires a model/tool round trip; governed and circuit-broken.
    Remote,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Local => "local",
            ExecutionMode::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The routing decision for one request. Built once, consumed by dispatch,
/// never persisted.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub mode: ExecutionMode,
    pub intent: Intent,
    /// Local tool names this route needs. Empty for Remote routes — the
    /// orchestrator discovers tools from the registry.
    pub required_tools: Vec<String>,
}

impl RoutePlan {
    pub fn is_local(&self) -> bool {
        self.mode == ExecutionMode::Local
    }
}

/// Map an intent to its execution path.
///
/// A `Conversation` intent carrying the `fallback-default` marker means the
/// classifier already degraded (empty input, breaker open, or timeout);
/// sending it to the remote path would hand degraded traffic to the very
/// dependency that just failed, so it is answered locally with a canned
/// reply.
pub fn route(intent: Intent) -> RoutePlan {
    let (mode, required_tools) = match intent.kind {
        IntentKind::LocationQuery => (ExecutionMode::Local, vec!["current_location".to_string()]),
        IntentKind::FileSearch => (ExecutionMode::Local, vec!["find_files".to_string()]),
        IntentKind::FileRead => (ExecutionMode::Local, vec!["read_file".to_string()]),
        IntentKind::ShellExecution => (ExecutionMode::Local, vec!["run_command".to_string()]),
        IntentKind::DataAnalysis => (ExecutionMode::Local, vec!["summarize_data".to_string()]),
        IntentKind::RemoteToolRequired => (ExecutionMode::Remote, Vec::new()),
        IntentKind::Conversation => {
            if intent.source == IntentSource::FallbackDefault {
                (ExecutionMode::Local, Vec::new())
            } else {
                (ExecutionMode::Remote, Vec::new())
            }
        }
    };

    RoutePlan {
        mode,
        intent,
        required_tools,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentSource;

    #[test]
    fn test_route_is_total() {
        // Every kind × source combination routes without panicking.
        for kind in IntentKind::ALL {
            for source in [
                IntentSource::Heuristic,
                IntentSource::Model,
                IntentSource::FallbackDefault,
            ] {
                let plan = route(Intent { kind, source });
                assert_eq!(plan.intent.kind, kind);
            }
        }
    }

    #[test]
    fn test_local_intents_bypass_remote_path() {
        for kind in [
            IntentKind::LocationQuery,
            IntentKind::FileSearch,
            IntentKind::FileRead,
            IntentKind::ShellExecution,
            IntentKind::DataAnalysis,
        ] {
            let plan = route(Intent::heuristic(kind));
            assert!(plan.is_local(), "{kind} must route local");
            assert_eq!(plan.required_tools.len(), 1);
        }
    }

    #[test]
    fn test_remote_intents() {
        assert_eq!(
            route(Intent::heuristic(IntentKind::RemoteToolRequired)).mode,
            ExecutionMode::Remote
        );
        assert_eq!(
            route(Intent::model(IntentKind::Conversation)).mode,
            ExecutionMode::Remote
        );
        assert_eq!(
            route(Intent::heuristic(IntentKind::Conversation)).mode,
            ExecutionMode::Remote
        );
    }

    #[test]
    fn test_degraded_conversation_routes_local() {
        let plan = route(Intent::fallback_default());
        assert!(plan.is_local());
        assert!(plan.required_tools.is_empty());
    }
}
