//! Intent classification types.
//!
//! An [`Intent`] is the classified category of one request plus a marker for
//! how the classification was produced. It is created fresh per request,
//! never mutated, and discarded once the routing decision is made (a copy may
//! live in the classification cache, keyed by normalized-text fingerprint).

pub mod rules;

use serde::{Deserialize, Serialize};

/// The fixed set of request categories the pipeline routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// "Where am I?" / "pwd" — answered from process state.
    LocationQuery,
    /// Find files by name or pattern.
    FileSearch,
    /// Read a single named file.
    FileRead,
    /// Run a shell command the caller spelled out.
    ShellExecution,
    /// Summarize or compute over a local data file.
    DataAnalysis,
    /// Needs a remote tool family (paper search, financial data, ...).
    RemoteToolRequired,
    /// Plain conversation; also the safe default.
    Conversation,
}

impl IntentKind {
    /// All kinds, for totality tests and closed-schema prompts.
    pub const ALL: [IntentKind; 7] = [
        IntentKind::LocationQuery,
        IntentKind::FileSearch,
        IntentKind::FileRead,
        IntentKind::ShellExecution,
        IntentKind::DataAnalysis,
        IntentKind::RemoteToolRequired,
        IntentKind::Conversation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::LocationQuery => "location_query",
            IntentKind::FileSearch => "file_search",
            IntentKind::FileRead => "file_read",
            IntentKind::ShellExecution => "shell_execution",
            IntentKind::DataAnalysis => "data_analysis",
            IntentKind::RemoteToolRequired => "remote_tool_required",
            IntentKind::Conversation => "conversation",
        }
    }

    /// Strict parse of a remote classification answer. Anything outside the
    /// closed set is `None`; the classifier treats that as fallback, never as
    /// a parse-what-we-can guess.
    pub fn parse(s: &str) -> Option<IntentKind> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        IntentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an intent classification was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    /// Matched by the ordered heuristic rule table.
    Heuristic,
    /// Chosen by the remote model fallback.
    Model,
    /// Safe default after empty input or fallback failure.
    FallbackDefault,
}

impl IntentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentSource::Heuristic => "heuristic",
            IntentSource::Model => "model",
            IntentSource::FallbackDefault => "fallback-default",
        }
    }
}

impl std::fmt::Display for IntentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The classified category of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub source: IntentSource,
}

impl Intent {
    pub fn heuristic(kind: IntentKind) -> Self {
        Self {
            kind,
            source: IntentSource::Heuristic,
        }
    }

    pub fn model(kind: IntentKind) -> Self {
        Self {
            kind,
            source: IntentSource::Model,
        }
    }

    /// The classifier's terminal fallback: harmless, never blocks.
    pub fn fallback_default() -> Self {
        Self {
            kind: IntentKind::Conversation,
            source: IntentSource::FallbackDefault,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == IntentSource::FallbackDefault
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.source)
    }
}
